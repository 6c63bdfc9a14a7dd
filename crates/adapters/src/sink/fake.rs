// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake sink for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use async_trait::async_trait;
use jx_core::{Query, QueryResult, Sink, SinkError, Target, TargetId};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Recorded write
#[derive(Debug, Clone)]
pub struct SinkCall {
    pub target: TargetId,
    pub query: String,
    pub results: Vec<QueryResult>,
}

#[derive(Default)]
struct State {
    calls: Mutex<Vec<SinkCall>>,
    fail_writes: AtomicBool,
    fail_start: AtomicBool,
    starts: AtomicUsize,
    stops: AtomicUsize,
}

/// Fake sink for testing
#[derive(Clone)]
pub struct FakeSink {
    name: String,
    state: Arc<State>,
}

impl FakeSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::default(),
        }
    }

    /// Make subsequent writes fail (or succeed again)
    pub fn set_fail_writes(&self, fail: bool) {
        self.state.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_start(&self, fail: bool) {
        self.state.fail_start.store(fail, Ordering::SeqCst);
    }

    /// Get all recorded writes
    pub fn calls(&self) -> Vec<SinkCall> {
        self.state
            .calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Total number of results received across all writes
    pub fn result_count(&self) -> usize {
        self.calls().iter().map(|c| c.results.len()).sum()
    }

    pub fn starts(&self) -> usize {
        self.state.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.state.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Sink for FakeSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> Result<(), SinkError> {
        self.state.starts.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_start.load(Ordering::SeqCst) {
            return Err(SinkError::Lifecycle {
                sink: self.name.clone(),
                action: "start",
                message: "injected failure".to_string(),
            });
        }
        Ok(())
    }

    async fn stop(&self) -> Result<(), SinkError> {
        self.state.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn write(
        &self,
        target: &Target,
        query: &Query,
        results: &[QueryResult],
    ) -> Result<(), SinkError> {
        if self.state.fail_writes.load(Ordering::SeqCst) {
            return Err(SinkError::Write {
                sink: self.name.clone(),
                message: "injected failure".to_string(),
            });
        }
        self.state
            .calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(SinkCall {
                target: target.id().clone(),
                query: query.object().to_string(),
                results: results.to_vec(),
            });
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
