// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Helpers shared by this crate's tests

use jx_core::{Query, QueryResult, Target, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// A writer that captures log output for testing
#[derive(Clone, Default)]
pub struct CapturedLogs {
    logs: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    pub fn contents(&self) -> String {
        let logs = self.logs.lock().unwrap();
        String::from_utf8_lossy(&logs).to_string()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.logs.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run a future on a fresh runtime with captured tracing output
pub fn with_tracing<F, Fut>(f: F) -> (String, Fut::Output)
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future,
{
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(logs.clone())
        .with_ansi(false)
        .without_time()
        .finish();

    let result = tracing::subscriber::with_default(subscriber, || {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(f())
    });

    (logs.contents(), result)
}

pub fn target() -> Target {
    Target::remote("db1", 9999)
}

pub fn memory_query() -> Query {
    Query::parse("java.lang:type=Memory").unwrap()
}

pub fn heap_result(used: i64) -> QueryResult {
    let mut values = BTreeMap::new();
    values.insert("used".to_string(), Value::Integer(used));
    values.insert("committed".to_string(), Value::Integer(used * 2));
    QueryResult {
        epoch_ms: 1_700_000_000_000,
        attribute: "HeapMemoryUsage".to_string(),
        class_name: "sun.management.MemoryImpl".to_string(),
        domain: "java.lang".to_string(),
        alias: None,
        type_name: "type=Memory".to_string(),
        values,
    }
}
