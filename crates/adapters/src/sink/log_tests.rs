// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::{heap_result, memory_query, target, with_tracing};

#[test]
fn logs_each_result() {
    let (logs, result) = with_tracing(|| async {
        let sink = LogSink::new("log");
        sink.write(&target(), &memory_query(), &[heap_result(7), heap_result(8)])
            .await
    });

    assert!(result.is_ok());
    assert_eq!(logs.matches("HeapMemoryUsage").count(), 2, "{}", logs);
    assert!(logs.contains("target_id=db1:9999"), "{}", logs);
    assert!(logs.contains("\"used\": Integer(7)"), "{}", logs);
}

#[tokio::test]
async fn name_is_reported() {
    assert_eq!(LogSink::new("audit").name(), "audit");
}
