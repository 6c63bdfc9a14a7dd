// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler: one fixed-rate job per target

use crate::config::SchedulerConfig;
use crate::dispatch::TargetDispatcher;
use crate::execution::QueryProcessor;
use crate::model::{Target, TargetId};
use crate::pool::{ExecutorRepository, PoolError};
use crate::registry::{JobInfo, ScheduledJob, TargetRegistry};
use crate::timer::{TickFn, Timer, TimerError};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

const FALLBACK_RUN_PERIOD: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("scheduler is stopped")]
    Stopped,
    #[error("no worker pool for {target}: {source}")]
    Pool {
        target: TargetId,
        #[source]
        source: PoolError,
    },
    #[error("cannot schedule {target}: {source}")]
    Timer {
        target: TargetId,
        #[source]
        source: TimerError,
    },
}

/// Outcome of [`Scheduler::reload`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReloadReport {
    pub scheduled: Vec<TargetId>,
    /// Targets no longer configured
    pub removed: Vec<TargetId>,
    pub failed: Vec<TargetId>,
}

/// Owns the target registry and drives each target's dispatcher from the
/// timer.
///
/// Ticks fire at a fixed rate, so a tick can start while query executions
/// from the previous one are still running. Executions only overlap up to
/// the capacity of the target's worker pool.
pub struct Scheduler {
    config: SchedulerConfig,
    timer: Arc<dyn Timer>,
    registry: TargetRegistry,
    executors: Arc<dyn ExecutorRepository>,
    processor: Arc<QueryProcessor>,
    mutation: Mutex<()>,
    stopped: AtomicBool,
}

impl Scheduler {
    pub fn new(
        mut config: SchedulerConfig,
        timer: Arc<dyn Timer>,
        executors: Arc<dyn ExecutorRepository>,
        processor: Arc<QueryProcessor>,
    ) -> Self {
        if config.run_period.is_zero() {
            config.run_period = FALLBACK_RUN_PERIOD;
        }
        Self {
            config,
            timer,
            registry: TargetRegistry::new(),
            executors,
            processor,
            mutation: Mutex::new(()),
            stopped: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn executors(&self) -> &Arc<dyn ExecutorRepository> {
        &self.executors
    }

    /// The target's own period when positive, else the configured default
    pub fn run_period(&self, target: &Target) -> Duration {
        target
            .run_period()
            .filter(|p| !p.is_zero())
            .unwrap_or(self.config.run_period)
    }

    /// Start polling `target`, replacing any job for the same id. The first
    /// tick comes one period from now.
    pub fn schedule(&self, target: Target) -> Result<Uuid, ScheduleError> {
        let _guard = self.mutation.lock().unwrap_or_else(|e| e.into_inner());
        if self.stopped.load(Ordering::SeqCst) {
            return Err(ScheduleError::Stopped);
        }

        let target = Arc::new(target);
        self.executors
            .put(&target)
            .map_err(|source| ScheduleError::Pool {
                target: target.id().clone(),
                source,
            })?;
        let period = self.run_period(&target);
        let dispatcher = Arc::new(TargetDispatcher::new(
            Arc::clone(&target),
            Arc::clone(&self.executors),
            Arc::clone(&self.processor),
        ));
        let ticker = Arc::clone(&dispatcher);
        let tick: TickFn = Arc::new(move || ticker.run_tick());
        let handle = self
            .timer
            .schedule_at_fixed_rate(target.id().as_str(), period, period, tick)
            .map_err(|source| ScheduleError::Timer {
                target: target.id().clone(),
                source,
            })?;

        let id = Uuid::new_v4();
        let replaced = self.registry.put(ScheduledJob {
            id,
            target: Arc::clone(&target),
            period,
            handle,
            dispatcher,
            scheduled_at: chrono::Utc::now(),
        });
        info!(
            target_id = %target.id(),
            job = %id,
            period_secs = period.as_secs_f64(),
            queries = target.queries().len(),
            replaced = replaced.is_some(),
            "target scheduled"
        );
        Ok(id)
    }

    /// Same as [`schedule`](Self::schedule)
    pub fn put(&self, target: Target) -> Result<Uuid, ScheduleError> {
        self.schedule(target)
    }

    /// Stop polling a target and release its pool. Returns whether it was
    /// scheduled; unknown ids are a no-op.
    pub async fn unschedule(&self, id: &TargetId) -> bool {
        let removed = {
            let _guard = self.mutation.lock().unwrap_or_else(|e| e.into_inner());
            self.registry.remove(id)
        };
        self.executors.remove(id).await;
        if removed.is_some() {
            info!(target_id = %id, "target unscheduled");
        }
        removed.is_some()
    }

    /// Same as [`unschedule`](Self::unschedule)
    pub async fn remove(&self, id: &TargetId) -> bool {
        self.unschedule(id).await
    }

    /// Cancel every job. Worker pools stay up and in-flight executions
    /// finish on their own.
    pub fn unschedule_all(&self) -> usize {
        let _guard = self.mutation.lock().unwrap_or_else(|e| e.into_inner());
        let cancelled = self.registry.drain().len();
        if cancelled > 0 {
            info!(count = cancelled, "all targets unscheduled");
        }
        cancelled
    }

    /// Replace the whole target list. Pools of targets that are gone are
    /// drained.
    pub async fn reload(&self, targets: Vec<Target>) -> ReloadReport {
        let keep: HashSet<TargetId> = targets.iter().map(|t| t.id().clone()).collect();
        let previous = self.registry.ids();
        self.unschedule_all();

        let mut report = ReloadReport::default();
        for target in targets {
            let id = target.id().clone();
            match self.schedule(target) {
                Ok(_) => report.scheduled.push(id),
                Err(e) => {
                    error!(target_id = %id, error = %e, "failed to schedule target");
                    report.failed.push(id);
                }
            }
        }
        for id in previous.into_iter().filter(|id| !keep.contains(id)) {
            self.executors.remove(&id).await;
            report.removed.push(id);
        }
        info!(
            scheduled = report.scheduled.len(),
            removed = report.removed.len(),
            failed = report.failed.len(),
            "targets reloaded"
        );
        report
    }

    /// Cancel all jobs and shut the timer down. Only the first call does
    /// anything.
    pub fn stop(&self) {
        let _guard = self.mutation.lock().unwrap_or_else(|e| e.into_inner());
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        self.registry.drain();
        self.timer.shutdown();
        info!("scheduler stopped");
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Stop, then drain the worker pools
    pub async fn shutdown(&self) {
        self.stop();
        self.executors.shutdown().await;
    }

    pub fn jobs(&self) -> Vec<JobInfo> {
        self.registry.snapshot()
    }

    pub fn is_scheduled(&self, id: &TargetId) -> bool {
        self.registry.contains(id)
    }

    /// The target currently scheduled under `id`
    pub fn target(&self, id: &TargetId) -> Option<Arc<Target>> {
        self.registry.target(id)
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
