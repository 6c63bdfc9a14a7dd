// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sink contract and the generic sink wrappers
//!
//! Concrete sinks live outside the core; the core only needs `write`
//! plus the start/stop lifecycle. Wrappers compose:
//! - **MaxBatchSizeSink**: split a batch into fixed-size chunks
//! - **TransformingSink**: rewrite result values before delivery
//! - **CircuitBreakerSink**: stop calling a sink that keeps failing

mod batch;
mod breaker;
mod transforming;

pub use batch::MaxBatchSizeSink;
pub use breaker::CircuitBreakerSink;
pub use transforming::TransformingSink;

use crate::model::{Query, QueryResult, Target};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors from sinks
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink {sink} failed to write: {message}")]
    Write { sink: String, message: String },
    #[error("sink {sink} failed to {action}: {message}")]
    Lifecycle {
        sink: String,
        action: &'static str,
        message: String,
    },
    #[error("sink {sink} is not accepting writes (circuit open)")]
    CircuitOpen { sink: String },
}

/// Receiver of query results
#[async_trait]
pub trait Sink: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    async fn start(&self) -> Result<(), SinkError> {
        Ok(())
    }

    async fn stop(&self) -> Result<(), SinkError> {
        Ok(())
    }

    async fn write(
        &self,
        target: &Target,
        query: &Query,
        results: &[QueryResult],
    ) -> Result<(), SinkError>;
}

/// Shared handle to a sink
pub type SinkRef = Arc<dyn Sink>;

#[async_trait]
impl<S: Sink + ?Sized> Sink for Arc<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn start(&self) -> Result<(), SinkError> {
        (**self).start().await
    }

    async fn stop(&self) -> Result<(), SinkError> {
        (**self).stop().await
    }

    async fn write(
        &self,
        target: &Target,
        query: &Query,
        results: &[QueryResult],
    ) -> Result<(), SinkError> {
        (**self).write(target, query, results).await
    }
}
