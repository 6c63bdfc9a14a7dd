// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use async_trait::async_trait;
use jx_core::{Connection, ConnectionError, ConnectionFactory, Endpoint};

/// Factory for builds without a remote transport: every connect fails.
/// `local` targets are unaffected since they never go through a factory.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpConnectionFactory;

impl NoOpConnectionFactory {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ConnectionFactory for NoOpConnectionFactory {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn Connection>, ConnectionError> {
        Err(ConnectionError::Connect {
            endpoint: endpoint.to_string(),
            message: "no remote transport is available".to_string(),
        })
    }
}
