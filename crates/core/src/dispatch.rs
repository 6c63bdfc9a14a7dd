// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-target tick: fan the target's queries out to its worker pool

use crate::execution::QueryProcessor;
use crate::model::{Target, TargetId};
use crate::pool::{ExecutorRepository, PoolError};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, warn, Level};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no worker pool for {target}")]
    Pool {
        target: TargetId,
        #[source]
        source: PoolError,
    },
}

/// Submission counts for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub submitted: usize,
    pub rejected: usize,
}

/// Dispatches one target's queries on every tick.
///
/// A tick only submits; it never waits for query executions, so a slow
/// query may still be running when the next tick submits it again.
pub struct TargetDispatcher {
    target: Arc<Target>,
    executors: Arc<dyn ExecutorRepository>,
    processor: Arc<QueryProcessor>,
    ticks: AtomicU64,
    in_tick: AtomicBool,
}

impl TargetDispatcher {
    pub fn new(
        target: Arc<Target>,
        executors: Arc<dyn ExecutorRepository>,
        processor: Arc<QueryProcessor>,
    ) -> Self {
        Self {
            target,
            executors,
            processor,
            ticks: AtomicU64::new(0),
            in_tick: AtomicBool::new(false),
        }
    }

    pub fn target(&self) -> &Arc<Target> {
        &self.target
    }

    /// Ticks run so far
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    /// Whether a tick is submitting right now
    pub fn is_ticking(&self) -> bool {
        self.in_tick.load(Ordering::SeqCst)
    }

    /// Submit every query. A saturated pool drops that one query for this
    /// tick and the rest are still tried.
    pub fn tick(&self) -> Result<TickReport, DispatchError> {
        let pool = self
            .executors
            .executor_for(&self.target)
            .map_err(|source| self.pool_error(source))?;

        let mut report = TickReport::default();
        for query in self.target.queries() {
            let target = Arc::clone(&self.target);
            let processor = Arc::clone(&self.processor);
            let owned = query.clone();
            let submitted = pool.submit(async move {
                processor.run(&target, &owned).await;
            });
            match submitted {
                Ok(_) => report.submitted += 1,
                Err(PoolError::Saturated { pool, capacity }) => {
                    error!(
                        target_id = %self.target.id(),
                        query = %query,
                        pool = %pool,
                        capacity,
                        "query pool is full, skipping query this tick; increase the query pool size"
                    );
                    report.rejected += 1;
                }
                Err(source) => return Err(self.pool_error(source)),
            }
        }
        Ok(report)
    }

    /// Run a tick, logging instead of returning failures
    pub fn run_tick(&self) {
        let n = self.ticks.fetch_add(1, Ordering::SeqCst) + 1;
        self.in_tick.store(true, Ordering::SeqCst);
        let outcome = self.tick();
        self.in_tick.store(false, Ordering::SeqCst);
        match outcome {
            Ok(report) => debug!(
                target_id = %self.target.id(),
                tick = n,
                submitted = report.submitted,
                rejected = report.rejected,
                "tick dispatched"
            ),
            Err(e) if tracing::enabled!(Level::DEBUG) => debug!(
                target_id = %self.target.id(),
                tick = n,
                error = %error_chain(&e),
                "tick failed"
            ),
            Err(e) => warn!(target_id = %self.target.id(), tick = n, error = %e, "tick failed"),
        }
    }

    fn pool_error(&self, source: PoolError) -> DispatchError {
        DispatchError::Pool {
            target: self.target.id().clone(),
            source,
        }
    }
}

/// `err: cause: cause ...`
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
