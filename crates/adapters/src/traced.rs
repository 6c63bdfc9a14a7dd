// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use async_trait::async_trait;
use jx_core::{
    Connection, ConnectionError, ConnectionFactory, Endpoint, Query, QueryResult, Sink, SinkError,
    Target,
};
use std::time::Instant;
use tracing::Instrument;

/// Wrapper that adds a span and timing to every write of any Sink
#[derive(Clone)]
pub struct TracedSink<S> {
    inner: S,
}

impl<S> TracedSink<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S: Sink> Sink for TracedSink<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn start(&self) -> Result<(), SinkError> {
        let result = self.inner.start().await;
        match &result {
            Ok(()) => tracing::info!(sink = self.inner.name(), "sink started"),
            Err(e) => tracing::error!(sink = self.inner.name(), error = %e, "sink start failed"),
        }
        result
    }

    async fn stop(&self) -> Result<(), SinkError> {
        let result = self.inner.stop().await;
        match &result {
            Ok(()) => tracing::info!(sink = self.inner.name(), "sink stopped"),
            Err(e) => tracing::warn!(sink = self.inner.name(), error = %e, "sink stop failed"),
        }
        result
    }

    async fn write(
        &self,
        target: &Target,
        query: &Query,
        results: &[QueryResult],
    ) -> Result<(), SinkError> {
        let span = tracing::info_span!(
            "sink.write",
            sink = self.inner.name(),
            target_id = %target.id(),
            query = %query.object(),
        );

        async {
            tracing::debug!(results = results.len(), "writing");

            let start = Instant::now();
            let result = self.inner.write(target, query, results).await;
            let elapsed = start.elapsed();

            match &result {
                Ok(()) => tracing::debug!(elapsed_ms = elapsed.as_millis() as u64, "written"),
                Err(e) => tracing::error!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "write failed"
                ),
            }
            result
        }
        .instrument(span)
        .await
    }
}

/// Wrapper that logs every connect of any ConnectionFactory
#[derive(Clone)]
pub struct TracedConnectionFactory<F> {
    inner: F,
}

impl<F> TracedConnectionFactory<F> {
    pub fn new(inner: F) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<F: ConnectionFactory> ConnectionFactory for TracedConnectionFactory<F> {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn Connection>, ConnectionError> {
        let span = tracing::info_span!("connection.connect", endpoint = %endpoint);

        async {
            tracing::debug!("connecting");

            let start = Instant::now();
            let result = self.inner.connect(endpoint).await;
            let elapsed = start.elapsed();

            match &result {
                Ok(_) => tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "connected"),
                Err(e) => tracing::error!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "connect failed"
                ),
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
