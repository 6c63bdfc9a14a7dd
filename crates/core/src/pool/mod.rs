// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded worker pools that run query executions
//!
//! Submission never blocks: a full backlog is reported as
//! [`PoolError::Saturated`] and the caller moves on. Pools are handed out
//! by an [`ExecutorRepository`], either one pool for every target or one
//! per target.

mod metrics;
mod repository;
mod worker;

pub use metrics::{CountingPoolMetrics, NoOpPoolMetrics, PoolCounters, PoolMetrics};
pub use repository::{
    build_repository, ExecutorRepository, PerTargetExecutors, PoolTopology, SharedExecutors,
};
pub use worker::{PoolGauges, TaskHandle, TaskOutcome, WorkerPool, WorkerPoolConfig};

use thiserror::Error;

/// Errors from submitting to a pool
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("pool {pool} is saturated ({capacity} tasks queued)")]
    Saturated { pool: String, capacity: usize },
    #[error("pool {pool} is shut down")]
    ShutDown { pool: String },
    #[error("no pool registered for target {target}")]
    Unknown { target: String },
    #[error("worker pools need a running tokio runtime")]
    NoRuntime,
}
