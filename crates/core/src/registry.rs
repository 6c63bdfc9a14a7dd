// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry of scheduled targets

use crate::dispatch::TargetDispatcher;
use crate::model::{Target, TargetId};
use crate::timer::TimerHandle;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// A target bound to its repeating job
pub struct ScheduledJob {
    pub id: Uuid,
    pub target: Arc<Target>,
    pub period: Duration,
    pub handle: TimerHandle,
    pub dispatcher: Arc<TargetDispatcher>,
    pub scheduled_at: DateTime<Utc>,
}

impl ScheduledJob {
    pub fn state(&self) -> JobState {
        if self.handle.is_cancelled() {
            JobState::Cancelled
        } else if self.dispatcher.is_ticking() {
            JobState::Running
        } else {
            JobState::Scheduled
        }
    }

    pub fn info(&self) -> JobInfo {
        JobInfo {
            id: self.id,
            target: self.target.id().clone(),
            period: self.period,
            state: self.state(),
            ticks: self.dispatcher.ticks(),
            scheduled_at: self.scheduled_at,
        }
    }

    fn cancel(&self) {
        self.handle.cancel();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Scheduled,
    /// A tick is submitting queries
    Running,
    Cancelled,
}

/// Read-only view of a scheduled job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobInfo {
    pub id: Uuid,
    pub target: TargetId,
    pub period: Duration,
    pub state: JobState,
    pub ticks: u64,
    pub scheduled_at: DateTime<Utc>,
}

/// One job per target id. Every job leaving the registry is cancelled.
#[derive(Default)]
pub struct TargetRegistry {
    jobs: Mutex<HashMap<TargetId, ScheduledJob>>,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `job`, cancelling and returning the job it replaces
    pub fn put(&self, job: ScheduledJob) -> Option<ScheduledJob> {
        let replaced = self
            .jobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(job.target.id().clone(), job);
        if let Some(old) = &replaced {
            old.cancel();
        }
        replaced
    }

    /// Cancel and remove; unknown ids are ignored
    pub fn remove(&self, id: &TargetId) -> Option<ScheduledJob> {
        let removed = self
            .jobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(id);
        if let Some(job) = &removed {
            job.cancel();
        }
        removed
    }

    /// Cancel and remove everything
    pub fn drain(&self) -> Vec<ScheduledJob> {
        let jobs: Vec<ScheduledJob> = self
            .jobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain()
            .map(|(_, job)| job)
            .collect();
        for job in &jobs {
            job.cancel();
        }
        jobs
    }

    /// Jobs ordered by target id
    pub fn snapshot(&self) -> Vec<JobInfo> {
        let mut infos: Vec<JobInfo> = self
            .jobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .map(ScheduledJob::info)
            .collect();
        infos.sort_by(|a, b| a.target.cmp(&b.target));
        infos
    }

    pub fn target(&self, id: &TargetId) -> Option<Arc<Target>> {
        self.jobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .map(|job| Arc::clone(&job.target))
    }

    pub fn ids(&self) -> Vec<TargetId> {
        let mut ids: Vec<TargetId> = self
            .jobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    pub fn contains(&self, id: &TargetId) -> bool {
        self.jobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
