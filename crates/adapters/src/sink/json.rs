// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One JSON object per result, newline delimited

use async_trait::async_trait;
use jx_core::{Query, QueryResult, Sink, SinkError, Target};
use serde::Serialize;
use std::io::Write;
use std::sync::Mutex;

#[derive(Serialize)]
struct Line<'a> {
    target: &'a str,
    query: &'a str,
    #[serde(flatten)]
    result: &'a QueryResult,
}

/// Writes each result as a JSON line to `W`
pub struct JsonLinesSink<W> {
    name: String,
    out: Mutex<W>,
}

impl JsonLinesSink<std::io::Stdout> {
    pub fn stdout(name: impl Into<String>) -> Self {
        Self::new(name, std::io::stdout())
    }
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(name: impl Into<String>, out: W) -> Self {
        Self {
            name: name.into(),
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|e| e.into_inner())
    }

    fn write_error(&self, e: impl std::fmt::Display) -> SinkError {
        SinkError::Write {
            sink: self.name.clone(),
            message: e.to_string(),
        }
    }
}

#[async_trait]
impl<W: Write + Send> Sink for JsonLinesSink<W> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn stop(&self) -> Result<(), SinkError> {
        self.out
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .flush()
            .map_err(|e| SinkError::Lifecycle {
                sink: self.name.clone(),
                action: "stop",
                message: e.to_string(),
            })
    }

    async fn write(
        &self,
        target: &Target,
        query: &Query,
        results: &[QueryResult],
    ) -> Result<(), SinkError> {
        let mut buf = Vec::new();
        for result in results {
            let line = Line {
                target: target.id().as_str(),
                query: query.object().as_str(),
                result,
            };
            serde_json::to_writer(&mut buf, &line).map_err(|e| self.write_error(e))?;
            buf.push(b'\n');
        }

        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        out.write_all(&buf).map_err(|e| self.write_error(e))?;
        out.flush().map_err(|e| self.write_error(e))
    }
}

#[cfg(test)]
#[path = "json_tests.rs"]
mod tests;
