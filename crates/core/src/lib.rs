// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! jx-core: scheduling and dispatch engine for polled management endpoints
//!
//! This crate provides:
//! - The data model (targets, queries, results, raw attribute values)
//! - A bounded worker pool with shared and per-target topologies
//! - A keyed connection pool with validate-before-reuse
//! - Query execution, result flattening and sink delivery
//! - A fixed-rate scheduler over a pluggable timer facility

pub mod clock;
pub mod config;
pub mod connection;
pub mod model;
pub mod pool;
pub mod sink;
pub mod transform;

mod dispatch;
mod execution;
mod flatten;
mod merge;
mod registry;
mod scheduler;
mod timer;

#[cfg(test)]
mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{ConnectionPoolConfig, SchedulerConfig};
pub use connection::{
    Connection, ConnectionError, ConnectionFactory, ConnectionProvider, KeyedConnectionPool,
    PooledConnection,
};
pub use dispatch::{DispatchError, TargetDispatcher, TickReport};
pub use execution::{DeliveryReport, ExecuteError, QueryProcessor};
pub use flatten::ResultFlattener;
pub use merge::TargetListBuilder;
pub use model::{
    Attribute, AttributeValue, CompositeValue, Credentials, Endpoint, NameError, ObjectInfo,
    ObjectName, ObjectPattern, Query, QueryResult, TabularRow, TabularValue, Target, TargetId,
    Value,
};
pub use pool::{
    build_repository, CountingPoolMetrics, ExecutorRepository, NoOpPoolMetrics, PerTargetExecutors,
    PoolCounters, PoolError, PoolGauges, PoolMetrics, PoolTopology, SharedExecutors, TaskHandle,
    TaskOutcome, WorkerPool, WorkerPoolConfig,
};
pub use registry::{JobInfo, JobState, ScheduledJob, TargetRegistry};
pub use scheduler::{ReloadReport, ScheduleError, Scheduler};
pub use sink::{
    CircuitBreakerSink, MaxBatchSizeSink, Sink, SinkError, SinkRef, TransformingSink,
};
pub use timer::{ManualTimer, TickFn, Timer, TimerError, TimerHandle, TokioTimer};
pub use transform::{
    BooleanAsNumber, ComposedTransformer, IdentityTransformer, NearZeroAsZero, ValueTransformer,
};
