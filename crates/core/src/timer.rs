// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed-rate repeating timers
//!
//! The scheduler only needs "run this every `period`, starting after
//! `initial_delay`, until cancelled". Ticks fire at
//! `start + k * period` regardless of how long the previous tick took.

use crate::clock::{Clock, FakeClock};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error};

/// Body of a repeating job
pub type TickFn = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimerError {
    #[error("timer is shut down")]
    ShutDown,
    #[error("timer needs a running tokio runtime")]
    NoRuntime,
    #[error("timer period must be positive")]
    InvalidPeriod,
}

/// Cancels a repeating job. Clones refer to the same job.
#[derive(Debug, Clone, Default)]
pub struct TimerHandle {
    cancelled: Arc<AtomicBool>,
    wake: Arc<Notify>,
}

impl TimerHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop future ticks. A tick already running is not interrupted.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.wake.notify_one();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Repeating timer facility
pub trait Timer: Send + Sync {
    fn schedule_at_fixed_rate(
        &self,
        name: &str,
        initial_delay: Duration,
        period: Duration,
        task: TickFn,
    ) -> Result<TimerHandle, TimerError>;

    /// Cancel every job and refuse new ones
    fn shutdown(&self);

    fn is_shutdown(&self) -> bool;
}

fn run_guarded(name: &str, task: &TickFn) {
    if catch_unwind(AssertUnwindSafe(|| task())).is_err() {
        error!(job = name, "tick panicked");
    }
}

/// Timer backed by tokio tasks, one per job
pub struct TokioTimer {
    runtime: tokio::runtime::Handle,
    jobs: Mutex<Vec<TimerHandle>>,
    shut_down: AtomicBool,
}

impl TokioTimer {
    /// Bind to the current runtime
    pub fn new() -> Result<Self, TimerError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| TimerError::NoRuntime)?;
        Ok(Self {
            runtime,
            jobs: Mutex::new(Vec::new()),
            shut_down: AtomicBool::new(false),
        })
    }
}

impl Timer for TokioTimer {
    fn schedule_at_fixed_rate(
        &self,
        name: &str,
        initial_delay: Duration,
        period: Duration,
        task: TickFn,
    ) -> Result<TimerHandle, TimerError> {
        if period.is_zero() {
            return Err(TimerError::InvalidPeriod);
        }
        let mut jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        if self.shut_down.load(Ordering::SeqCst) {
            return Err(TimerError::ShutDown);
        }
        jobs.retain(|h| !h.is_cancelled());

        let handle = TimerHandle::new();
        let job = handle.clone();
        let name = name.to_string();
        self.runtime.spawn(async move {
            let start = tokio::time::Instant::now() + initial_delay;
            let mut interval = tokio::time::interval_at(start, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
            loop {
                tokio::select! {
                    biased;
                    _ = job.wake.notified() => {}
                    _ = interval.tick() => {
                        if !job.is_cancelled() {
                            run_guarded(&name, &task);
                        }
                    }
                }
                if job.is_cancelled() {
                    break;
                }
            }
            debug!(job = %name, "timer job stopped");
        });

        jobs.push(handle.clone());
        Ok(handle)
    }

    fn shutdown(&self) {
        let jobs = std::mem::take(&mut *self.jobs.lock().unwrap_or_else(|e| e.into_inner()));
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }
        for job in jobs {
            job.cancel();
        }
    }

    fn is_shutdown(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

struct Entry {
    fire_at: Instant,
    seq: u64,
    name: String,
    period: Duration,
    task: TickFn,
    handle: TimerHandle,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at == other.fire_at && self.seq == other.seq
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Min-heap: earliest first, then in scheduling order
        Reverse((self.fire_at, self.seq)).cmp(&Reverse((other.fire_at, other.seq)))
    }
}

#[derive(Default)]
struct ManualState {
    entries: BinaryHeap<Entry>,
    next_seq: u64,
    fired: Vec<(String, Duration)>,
    shut_down: bool,
}

/// Virtual-time timer for tests and simulations.
///
/// Nothing fires until [`advance`](Self::advance) is called. Each due tick
/// runs on the caller's thread with the clock set to its scheduled time.
pub struct ManualTimer {
    clock: FakeClock,
    state: Mutex<ManualState>,
}

impl ManualTimer {
    pub fn new(clock: FakeClock) -> Self {
        Self {
            clock,
            state: Mutex::new(ManualState::default()),
        }
    }

    pub fn clock(&self) -> &FakeClock {
        &self.clock
    }

    /// Move time forward by `by`, firing every tick that falls due
    pub fn advance(&self, by: Duration) {
        let until = self.clock.now() + by;
        while let Some(entry) = self.pop_due(until) {
            self.clock.set(entry.fire_at);
            run_guarded(&entry.name, &entry.task);

            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            state
                .fired
                .push((entry.name.clone(), entry.fire_at - self.clock.origin()));
            if !entry.handle.is_cancelled() && !state.shut_down {
                let seq = state.next_seq;
                state.next_seq += 1;
                state.entries.push(Entry {
                    fire_at: entry.fire_at + entry.period,
                    seq,
                    ..entry
                });
            }
        }
        self.clock.set(until);
    }

    fn pop_due(&self, until: Instant) -> Option<Entry> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        while let Some(next) = state.entries.peek() {
            if next.fire_at > until {
                return None;
            }
            let entry = state.entries.pop()?;
            if !entry.handle.is_cancelled() {
                return Some(entry);
            }
        }
        None
    }

    /// Fired ticks as (job name, scheduled offset from the clock origin)
    pub fn fired(&self) -> Vec<(String, Duration)> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .fired
            .clone()
    }

    /// Offsets at which `name` fired
    pub fn fired_at(&self, name: &str) -> Vec<Duration> {
        self.fired()
            .into_iter()
            .filter(|(n, _)| n == name)
            .map(|(_, at)| at)
            .collect()
    }

    /// Jobs that will fire again
    pub fn pending(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entries
            .iter()
            .filter(|e| !e.handle.is_cancelled())
            .count()
    }
}

impl Timer for ManualTimer {
    fn schedule_at_fixed_rate(
        &self,
        name: &str,
        initial_delay: Duration,
        period: Duration,
        task: TickFn,
    ) -> Result<TimerHandle, TimerError> {
        if period.is_zero() {
            return Err(TimerError::InvalidPeriod);
        }
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.shut_down {
            return Err(TimerError::ShutDown);
        }
        let handle = TimerHandle::new();
        let seq = state.next_seq;
        state.next_seq += 1;
        state.entries.push(Entry {
            fire_at: self.clock.now() + initial_delay,
            seq,
            name: name.to_string(),
            period,
            task,
            handle: handle.clone(),
        });
        Ok(handle)
    }

    fn shutdown(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.shut_down = true;
        for entry in state.entries.drain() {
            entry.handle.cancel();
        }
    }

    fn is_shutdown(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .shut_down
    }
}

#[cfg(test)]
#[path = "timer_tests.rs"]
mod tests;
