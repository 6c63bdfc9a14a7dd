// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker pool statistics served through the in-process endpoint

use jx_adapters::{InProcessServer, ObjectSource};
use jx_core::{Attribute, CountingPoolMetrics, ExecutorRepository, ObjectName, WorkerPool};
use std::collections::HashSet;
use std::sync::Arc;

pub const POOL_CLASS_NAME: &str = "jx.WorkerPool";

/// Object name a pool is published under
pub fn pool_object_name(pool: &str) -> Option<ObjectName> {
    ObjectName::parse(&format!("jx:type=WorkerPool,name={}", pool)).ok()
}

/// Live view of one pool: gauges from the pool, totals from the metrics
pub struct PoolStatsSource {
    pool: Arc<WorkerPool>,
    metrics: Arc<CountingPoolMetrics>,
}

impl PoolStatsSource {
    pub fn new(pool: Arc<WorkerPool>, metrics: Arc<CountingPoolMetrics>) -> Self {
        Self { pool, metrics }
    }
}

impl ObjectSource for PoolStatsSource {
    fn class_name(&self) -> &str {
        POOL_CLASS_NAME
    }

    fn attributes(&self) -> Vec<Attribute> {
        let gauges = self.pool.gauges();
        let counters = self.metrics.counters(self.pool.name());
        vec![
            Attribute::new("Workers", gauges.workers as i64),
            Attribute::new("Backlog", gauges.backlog as i64),
            Attribute::new("Active", gauges.active as i64),
            Attribute::new("Queued", gauges.queued as i64),
            Attribute::new("Submitted", counters.submitted as i64),
            Attribute::new("Rejected", counters.rejected as i64),
            Attribute::new("Completed", counters.completed as i64),
            Attribute::new("Panicked", counters.panicked as i64),
            Attribute::new("BusyMillis", counters.busy.as_millis() as i64),
            Attribute::new("ShutDown", self.pool.is_shut_down()),
        ]
    }
}

/// Publishes every current pool and withdraws pools that are gone
pub fn publish_pools(
    server: &InProcessServer,
    executors: &dyn ExecutorRepository,
    metrics: &Arc<CountingPoolMetrics>,
) {
    let mut live = HashSet::new();
    for pool in executors.pools() {
        let Some(name) = pool_object_name(pool.name()) else {
            tracing::warn!(pool = pool.name(), "pool name is not a valid object name");
            continue;
        };
        live.insert(name.to_string());
        server.register(
            name,
            Arc::new(PoolStatsSource::new(pool, Arc::clone(metrics))),
        );
    }

    for name in server.names() {
        let is_pool = name.domain() == "jx" && name.property("type") == Some("WorkerPool");
        if is_pool && !live.contains(&name.to_string()) {
            server.unregister(&name);
        }
    }
}

#[cfg(test)]
#[path = "stats_tests.rs"]
mod tests;
