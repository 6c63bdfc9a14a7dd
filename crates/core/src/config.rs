// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration
//!
//! Loading is the daemon's job; these structs only carry defaults and
//! deserialize from any serde format. Durations use humantime strings
//! (`"60s"`, `"2m"`).

use crate::pool::PoolTopology;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Scheduler and worker pool settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Polling period for targets without an override
    #[serde(with = "humantime_serde")]
    pub run_period: Duration,
    /// Workers per query pool
    pub pool_size: usize,
    /// Queued tasks a pool accepts before rejecting submissions
    pub backlog_capacity: usize,
    pub topology: PoolTopology,
    /// Grace period for in-flight tasks when a pool shuts down
    #[serde(with = "humantime_serde")]
    pub drain_timeout: Duration,
    /// Pool name, or name prefix for per-target pools
    pub pool_name: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            run_period: Duration::from_secs(60),
            pool_size: 10,
            backlog_capacity: 1000,
            topology: PoolTopology::Shared,
            drain_timeout: Duration::from_secs(10),
            pool_name: "query".to_string(),
        }
    }
}

/// Keyed connection pool settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionPoolConfig {
    /// Connections open at once per endpoint
    pub max_per_key: usize,
    /// How long a borrow may wait for a free slot and connect
    #[serde(with = "humantime_serde")]
    pub borrow_timeout: Duration,
}

impl Default for ConnectionPoolConfig {
    fn default() -> Self {
        Self {
            max_per_key: 4,
            borrow_timeout: Duration::from_secs(10),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
