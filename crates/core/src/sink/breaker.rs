// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Circuit breaker around a sink
//!
//! Closed → Open after `failure_threshold` consecutive failures. While
//! open, writes fail fast with `CircuitOpen`. Once `open_for` has passed the
//! next write is a trial (half-open): success closes the circuit, failure
//! re-opens it. Other writes keep failing fast while the trial is out; a
//! trial that never reports back is replaced after another `open_for`.

use super::{Sink, SinkError};
use crate::clock::Clock;
use crate::model::{Query, QueryResult, Target};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{info, warn};

pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;
pub const DEFAULT_OPEN_FOR: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BreakerState {
    Closed { failures: u32 },
    Open { until: Instant },
    HalfOpen { since: Instant },
}

pub struct CircuitBreakerSink<S, C: Clock> {
    inner: S,
    clock: C,
    failure_threshold: u32,
    open_for: Duration,
    state: Mutex<BreakerState>,
}

impl<S: Sink, C: Clock> CircuitBreakerSink<S, C> {
    pub fn new(inner: S, clock: C) -> Self {
        Self {
            inner,
            clock,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            open_for: DEFAULT_OPEN_FOR,
            state: Mutex::new(BreakerState::Closed { failures: 0 }),
        }
    }

    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold.max(1);
        self
    }

    pub fn with_open_for(mut self, open_for: Duration) -> Self {
        self.open_for = open_for;
        self
    }

    pub fn is_open(&self) -> bool {
        matches!(self.current(), BreakerState::Open { .. })
    }

    fn current(&self) -> BreakerState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Decide whether a write may go through, moving Open → HalfOpen when due
    fn admit(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let now = self.clock.now();
        match *state {
            BreakerState::Closed { .. } => true,
            BreakerState::Open { until } if now < until => false,
            BreakerState::HalfOpen { since } if now < since + self.open_for => false,
            BreakerState::Open { .. } | BreakerState::HalfOpen { .. } => {
                info!(sink = self.inner.name(), "circuit breaker half opened");
                *state = BreakerState::HalfOpen { since: now };
                true
            }
        }
    }

    fn record(&self, ok: bool) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        *state = match (*state, ok) {
            (BreakerState::Closed { .. }, true) => BreakerState::Closed { failures: 0 },
            (BreakerState::HalfOpen { .. }, true) | (BreakerState::Open { .. }, true) => {
                info!(sink = self.inner.name(), "circuit breaker closed");
                BreakerState::Closed { failures: 0 }
            }
            (BreakerState::Closed { failures }, false)
                if failures + 1 < self.failure_threshold =>
            {
                BreakerState::Closed {
                    failures: failures + 1,
                }
            }
            (_, false) => {
                warn!(
                    sink = self.inner.name(),
                    open_for_secs = self.open_for.as_secs(),
                    "circuit breaker opened"
                );
                BreakerState::Open {
                    until: self.clock.now() + self.open_for,
                }
            }
        };
    }
}

#[async_trait]
impl<S: Sink, C: Clock> Sink for CircuitBreakerSink<S, C> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn start(&self) -> Result<(), SinkError> {
        self.inner.start().await
    }

    async fn stop(&self) -> Result<(), SinkError> {
        self.inner.stop().await
    }

    async fn write(
        &self,
        target: &Target,
        query: &Query,
        results: &[QueryResult],
    ) -> Result<(), SinkError> {
        if !self.admit() {
            return Err(SinkError::CircuitOpen {
                sink: self.inner.name().to_string(),
            });
        }
        let result = self.inner.write(target, query, results).await;
        self.record(result.is_ok());
        result
    }
}

#[cfg(test)]
#[path = "breaker_tests.rs"]
mod tests;
