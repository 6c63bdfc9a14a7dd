// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{PoolError, PoolMetrics};
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::oneshot;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

type Job = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Worker pool sizing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerPoolConfig {
    /// Pool name, used in logs and metrics
    pub name: String,
    pub workers: usize,
    /// Tasks that may wait for a free worker
    pub backlog: usize,
}

/// How a submitted task ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Completed,
    Panicked,
    /// Dropped before finishing, e.g. aborted after the shutdown grace period
    Abandoned,
}

/// Resolves when a submitted task finishes
#[derive(Debug)]
pub struct TaskHandle {
    done: oneshot::Receiver<TaskOutcome>,
}

impl TaskHandle {
    pub async fn join(self) -> TaskOutcome {
        self.done.await.unwrap_or(TaskOutcome::Abandoned)
    }
}

/// Point-in-time load of a pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolGauges {
    pub workers: usize,
    pub backlog: usize,
    /// Tasks currently running
    pub active: usize,
    /// Tasks waiting for a worker
    pub queued: usize,
}

/// Fixed number of workers draining a bounded queue
pub struct WorkerPool {
    name: String,
    workers: usize,
    backlog: usize,
    sender: Mutex<Option<mpsc::Sender<Job>>>,
    tasks: Mutex<Option<JoinSet<()>>>,
    active: Arc<AtomicUsize>,
    metrics: Arc<dyn PoolMetrics>,
}

impl WorkerPool {
    /// Start the workers on the current tokio runtime
    pub fn new(config: WorkerPoolConfig, metrics: Arc<dyn PoolMetrics>) -> Result<Self, PoolError> {
        let handle = tokio::runtime::Handle::try_current().map_err(|_| PoolError::NoRuntime)?;
        let workers = config.workers.max(1);
        let backlog = config.backlog.max(1);
        let (sender, receiver) = mpsc::channel::<Job>(backlog);
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));
        let active = Arc::new(AtomicUsize::new(0));

        let mut tasks = JoinSet::new();
        for worker in 0..workers {
            let receiver = Arc::clone(&receiver);
            let active = Arc::clone(&active);
            let pool = config.name.clone();
            tasks.spawn_on(
                async move {
                    debug!(%pool, worker, "worker started");
                    loop {
                        let job = receiver.lock().await.recv().await;
                        let Some(job) = job else { break };
                        active.fetch_add(1, Ordering::SeqCst);
                        job.await;
                        active.fetch_sub(1, Ordering::SeqCst);
                    }
                    debug!(%pool, worker, "worker stopped");
                },
                &handle,
            );
        }

        info!(pool = %config.name, workers, backlog, "worker pool started");
        Ok(Self {
            name: config.name,
            workers,
            backlog,
            sender: Mutex::new(Some(sender)),
            tasks: Mutex::new(Some(tasks)),
            active,
            metrics,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue a task without waiting. Fails with `Saturated` when the backlog
    /// is full and with `ShutDown` once [`shutdown`](Self::shutdown) started.
    pub fn submit<F>(&self, task: F) -> Result<TaskHandle, PoolError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .ok_or_else(|| PoolError::ShutDown {
                pool: self.name.clone(),
            })?;

        let (done_tx, done_rx) = oneshot::channel();
        let metrics = Arc::clone(&self.metrics);
        let pool = self.name.clone();
        let job: Job = Box::pin(async move {
            let started = Instant::now();
            let outcome = match AssertUnwindSafe(task).catch_unwind().await {
                Ok(()) => TaskOutcome::Completed,
                Err(_) => {
                    error!(%pool, "task panicked");
                    TaskOutcome::Panicked
                }
            };
            metrics.on_complete(&pool, started.elapsed(), outcome == TaskOutcome::Panicked);
            let _ = done_tx.send(outcome);
        });

        match sender.try_send(job) {
            Ok(()) => {
                self.metrics.on_submit(&self.name);
                Ok(TaskHandle { done: done_rx })
            }
            Err(TrySendError::Full(_)) => {
                self.metrics.on_reject(&self.name);
                Err(PoolError::Saturated {
                    pool: self.name.clone(),
                    capacity: self.backlog,
                })
            }
            Err(TrySendError::Closed(_)) => Err(PoolError::ShutDown {
                pool: self.name.clone(),
            }),
        }
    }

    pub fn gauges(&self) -> PoolGauges {
        let queued = self
            .sender
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|s| s.max_capacity() - s.capacity())
            .unwrap_or(0);
        PoolGauges {
            workers: self.workers,
            backlog: self.backlog,
            active: self.active.load(Ordering::SeqCst),
            queued,
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_none()
    }

    /// Stop accepting tasks and let queued and running ones finish.
    ///
    /// Whatever is still running after `grace` is aborted. Returns whether
    /// everything finished in time. Calling it again is a no-op.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        self.sender.lock().unwrap_or_else(|e| e.into_inner()).take();
        let tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner()).take();
        let Some(mut tasks) = tasks else {
            return true;
        };

        let drained = tokio::time::timeout(grace, drain(&mut tasks)).await.is_ok();
        if drained {
            info!(pool = %self.name, "worker pool drained");
        } else {
            warn!(
                pool = %self.name,
                grace_ms = grace.as_millis() as u64,
                "worker pool did not drain in time, abandoning remaining tasks"
            );
            tasks.abort_all();
        }
        drained
    }
}

async fn drain(tasks: &mut JoinSet<()>) {
    while tasks.join_next().await.is_some() {}
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
