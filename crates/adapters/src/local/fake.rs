// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake connection factory for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::InProcessServer;
use async_trait::async_trait;
use jx_core::{Connection, ConnectionError, ConnectionFactory, Endpoint};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Connects each endpoint to its own [`InProcessServer`]
#[derive(Clone, Default)]
pub struct FakeConnectionFactory {
    servers: Arc<Mutex<HashMap<Endpoint, Arc<InProcessServer>>>>,
    connects: Arc<AtomicUsize>,
    refuse: Arc<AtomicBool>,
}

impl FakeConnectionFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `server` at `endpoint`
    pub fn add(&self, endpoint: Endpoint, server: Arc<InProcessServer>) {
        self.servers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(endpoint, server);
    }

    /// Refuse every connection attempt while set
    pub fn set_refuse(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }

    /// Number of successful connects
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConnectionFactory for FakeConnectionFactory {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn Connection>, ConnectionError> {
        let refused = || ConnectionError::Connect {
            endpoint: endpoint.to_string(),
            message: "connection refused".to_string(),
        };
        if self.refuse.load(Ordering::SeqCst) {
            return Err(refused());
        }
        let server = self
            .servers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(endpoint)
            .cloned()
            .ok_or_else(refused)?;
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(server))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
