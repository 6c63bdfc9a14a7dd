// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{PoolError, PoolMetrics, WorkerPool, WorkerPoolConfig};
use crate::config::SchedulerConfig;
use crate::model::{Target, TargetId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::info;

/// How worker pools map to targets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolTopology {
    /// One pool for all targets
    #[default]
    Shared,
    /// A pool per target, so a slow target only backs up its own queue
    PerTarget,
}

/// Hands out the worker pool a target's queries run on
#[async_trait]
pub trait ExecutorRepository: Send + Sync {
    /// Register the target, creating its pool if it owns one
    fn put(&self, target: &Target) -> Result<Arc<WorkerPool>, PoolError>;

    /// The pool of a registered target. Targets never put, or since
    /// removed, get `Unknown`.
    fn executor_for(&self, target: &Target) -> Result<Arc<WorkerPool>, PoolError>;

    /// Forget the target; a pool owned only by it is drained
    async fn remove(&self, id: &TargetId);

    fn pools(&self) -> Vec<Arc<WorkerPool>>;

    /// Drain every pool. Later `executor_for` calls fail with `ShutDown`.
    async fn shutdown(&self);
}

/// Every target shares one pool
pub struct SharedExecutors {
    pool: Arc<WorkerPool>,
    drain_timeout: Duration,
}

impl SharedExecutors {
    pub fn new(config: &SchedulerConfig, metrics: Arc<dyn PoolMetrics>) -> Result<Self, PoolError> {
        let pool = WorkerPool::new(
            WorkerPoolConfig {
                name: config.pool_name.clone(),
                workers: config.pool_size,
                backlog: config.backlog_capacity,
            },
            metrics,
        )?;
        Ok(Self {
            pool: Arc::new(pool),
            drain_timeout: config.drain_timeout,
        })
    }
}

#[async_trait]
impl ExecutorRepository for SharedExecutors {
    fn put(&self, target: &Target) -> Result<Arc<WorkerPool>, PoolError> {
        self.executor_for(target)
    }

    fn executor_for(&self, _target: &Target) -> Result<Arc<WorkerPool>, PoolError> {
        if self.pool.is_shut_down() {
            return Err(PoolError::ShutDown {
                pool: self.pool.name().to_string(),
            });
        }
        Ok(Arc::clone(&self.pool))
    }

    async fn remove(&self, _id: &TargetId) {}

    fn pools(&self) -> Vec<Arc<WorkerPool>> {
        vec![Arc::clone(&self.pool)]
    }

    async fn shutdown(&self) {
        self.pool.shutdown(self.drain_timeout).await;
    }
}

/// Each target gets its own pool, created when the target is put
pub struct PerTargetExecutors {
    config: SchedulerConfig,
    metrics: Arc<dyn PoolMetrics>,
    pools: Mutex<HashMap<TargetId, Arc<WorkerPool>>>,
    closed: AtomicBool,
}

impl PerTargetExecutors {
    pub fn new(config: &SchedulerConfig, metrics: Arc<dyn PoolMetrics>) -> Self {
        Self {
            config: config.clone(),
            metrics,
            pools: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    fn pool_name(&self, id: &TargetId) -> String {
        format!("{}-{}", self.config.pool_name, id)
    }
}

#[async_trait]
impl ExecutorRepository for PerTargetExecutors {
    fn put(&self, target: &Target) -> Result<Arc<WorkerPool>, PoolError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(PoolError::ShutDown {
                pool: self.pool_name(target.id()),
            });
        }
        let mut pools = self.pools.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(pool) = pools.get(target.id()) {
            return Ok(Arc::clone(pool));
        }
        let pool = Arc::new(WorkerPool::new(
            WorkerPoolConfig {
                name: self.pool_name(target.id()),
                workers: self.config.pool_size,
                backlog: self.config.backlog_capacity,
            },
            Arc::clone(&self.metrics),
        )?);
        pools.insert(target.id().clone(), Arc::clone(&pool));
        Ok(pool)
    }

    fn executor_for(&self, target: &Target) -> Result<Arc<WorkerPool>, PoolError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(PoolError::ShutDown {
                pool: self.pool_name(target.id()),
            });
        }
        self.pools
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(target.id())
            .cloned()
            .ok_or_else(|| PoolError::Unknown {
                target: target.id().to_string(),
            })
    }

    async fn remove(&self, id: &TargetId) {
        let pool = self
            .pools
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(id);
        if let Some(pool) = pool {
            info!(target_id = %id, pool = pool.name(), "removing target pool");
            pool.shutdown(self.config.drain_timeout).await;
            self.metrics.forget(pool.name());
        }
    }

    fn pools(&self) -> Vec<Arc<WorkerPool>> {
        let mut pools: Vec<_> = self
            .pools
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect();
        pools.sort_by(|a, b| a.name().cmp(b.name()));
        pools
    }

    async fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let pools: Vec<_> = self
            .pools
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain()
            .map(|(_, pool)| pool)
            .collect();
        for pool in pools {
            pool.shutdown(self.config.drain_timeout).await;
        }
    }
}

/// Build the repository for the configured topology
pub fn build_repository(
    config: &SchedulerConfig,
    metrics: Arc<dyn PoolMetrics>,
) -> Result<Arc<dyn ExecutorRepository>, PoolError> {
    Ok(match config.topology {
        PoolTopology::Shared => Arc::new(SharedExecutors::new(config, metrics)?),
        PoolTopology::PerTarget => Arc::new(PerTargetExecutors::new(config, metrics)),
    })
}

#[cfg(test)]
#[path = "repository_tests.rs"]
mod tests;
