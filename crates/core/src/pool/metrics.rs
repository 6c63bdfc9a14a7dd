// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

/// Observer for pool activity. Called from submitters and workers, so
/// implementations must be cheap and must not block.
pub trait PoolMetrics: Send + Sync {
    fn on_submit(&self, pool: &str);
    fn on_reject(&self, pool: &str);
    fn on_complete(&self, pool: &str, elapsed: Duration, panicked: bool);

    /// The pool is gone; drop whatever is kept for it
    fn forget(&self, _pool: &str) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpPoolMetrics;

impl PoolMetrics for NoOpPoolMetrics {
    fn on_submit(&self, _pool: &str) {}
    fn on_reject(&self, _pool: &str) {}
    fn on_complete(&self, _pool: &str, _elapsed: Duration, _panicked: bool) {}
}

/// Running totals for one pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolCounters {
    pub submitted: u64,
    pub rejected: u64,
    pub completed: u64,
    pub panicked: u64,
    /// Summed task run time
    pub busy: Duration,
}

/// Keeps [`PoolCounters`] per pool name
#[derive(Debug, Default)]
pub struct CountingPoolMetrics {
    pools: Mutex<BTreeMap<String, PoolCounters>>,
}

impl CountingPoolMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counters(&self, pool: &str) -> PoolCounters {
        self.pools
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(pool)
            .copied()
            .unwrap_or_default()
    }

    /// Counters for every pool seen so far, ordered by name
    pub fn snapshot(&self) -> Vec<(String, PoolCounters)> {
        self.pools
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(name, counters)| (name.clone(), *counters))
            .collect()
    }

    fn update(&self, pool: &str, f: impl FnOnce(&mut PoolCounters)) {
        let mut pools = self.pools.lock().unwrap_or_else(|e| e.into_inner());
        f(pools.entry(pool.to_string()).or_default());
    }
}

impl PoolMetrics for CountingPoolMetrics {
    fn forget(&self, pool: &str) {
        self.pools
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(pool);
    }

    fn on_submit(&self, pool: &str) {
        self.update(pool, |c| c.submitted += 1);
    }

    fn on_reject(&self, pool: &str) {
        self.update(pool, |c| c.rejected += 1);
    }

    fn on_complete(&self, pool: &str, elapsed: Duration, panicked: bool) {
        self.update(pool, |c| {
            c.completed += 1;
            c.busy += elapsed;
            if panicked {
                c.panicked += 1;
            }
        });
    }
}
