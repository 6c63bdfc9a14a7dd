// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use async_trait::async_trait;
use jx_core::{Query, QueryResult, Sink, SinkError, Target};

/// Emits every result as an `info` event
pub struct LogSink {
    name: String,
}

impl LogSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Sink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(
        &self,
        target: &Target,
        query: &Query,
        results: &[QueryResult],
    ) -> Result<(), SinkError> {
        for result in results {
            tracing::info!(
                sink = %self.name,
                target_id = %target.id(),
                query = %query.object(),
                type_name = %result.type_name,
                attribute = %result.attribute,
                values = ?result.values,
                epoch_ms = result.epoch_ms,
                "result"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
