// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::local::{FakeConnectionFactory, InProcessServer};
use crate::sink::FakeSink;
use crate::test_support::{heap_result, memory_query, target, with_tracing};
use std::sync::Arc;

// =============================================================================
// Pass-through behaviour
// =============================================================================

#[tokio::test]
async fn traced_sink_forwards_writes() {
    let fake = FakeSink::new("fake");
    let traced = TracedSink::new(fake.clone());

    traced
        .write(&target(), &memory_query(), &[heap_result(1)])
        .await
        .unwrap();

    assert_eq!(traced.name(), "fake");
    assert_eq!(fake.result_count(), 1);
}

#[tokio::test]
async fn traced_sink_forwards_lifecycle() {
    let fake = FakeSink::new("fake");
    let traced = TracedSink::new(fake.clone());

    traced.start().await.unwrap();
    traced.stop().await.unwrap();

    assert_eq!((fake.starts(), fake.stops()), (1, 1));
}

// =============================================================================
// Tracing output verification tests
// =============================================================================

#[test]
fn traced_sink_write_logs_span_and_timing() {
    let (logs, result) = with_tracing(|| async {
        let traced = TracedSink::new(FakeSink::new("graphite"));
        traced
            .write(&target(), &memory_query(), &[heap_result(1), heap_result(2)])
            .await
    });

    assert!(result.is_ok(), "write should succeed: {:?}", result);
    assert!(
        logs.contains("sink.write"),
        "Should log span name. Logs:\n{}",
        logs
    );
    assert!(
        logs.contains("graphite"),
        "Should log sink name. Logs:\n{}",
        logs
    );
    assert!(
        logs.contains("results=2"),
        "Should log batch size. Logs:\n{}",
        logs
    );
    assert!(
        logs.contains("elapsed_ms"),
        "Should log timing. Logs:\n{}",
        logs
    );
}

#[test]
fn traced_sink_write_logs_failure() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeSink::new("graphite");
        fake.set_fail_writes(true);
        TracedSink::new(fake)
            .write(&target(), &memory_query(), &[heap_result(1)])
            .await
    });

    assert!(result.is_err());
    assert!(
        logs.contains("write failed"),
        "Should log failure. Logs:\n{}",
        logs
    );
    assert!(
        logs.contains("injected failure"),
        "Should log the error. Logs:\n{}",
        logs
    );
}

#[test]
fn traced_sink_start_failure_is_logged() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeSink::new("graphite");
        fake.set_fail_start(true);
        TracedSink::new(fake).start().await
    });

    assert!(result.is_err());
    assert!(
        logs.contains("sink start failed"),
        "Should log failure. Logs:\n{}",
        logs
    );
}

#[test]
fn traced_factory_logs_connect_outcomes() {
    let (logs, (ok, refused)) = with_tracing(|| async {
        let fake = FakeConnectionFactory::new();
        let up = Target::remote("db1", 9999);
        fake.add(up.endpoint().clone(), Arc::new(InProcessServer::new()));
        let traced = TracedConnectionFactory::new(fake);

        let ok = traced.connect(up.endpoint()).await.is_ok();
        let refused = traced
            .connect(Target::remote("db2", 9999).endpoint())
            .await
            .is_err();
        (ok, refused)
    });

    assert!(ok && refused);
    assert!(
        logs.contains("connection.connect"),
        "Should log span name. Logs:\n{}",
        logs
    );
    assert!(logs.contains("connected"), "Logs:\n{}", logs);
    assert!(logs.contains("connect failed"), "Logs:\n{}", logs);
    assert!(logs.contains("db2:9999"), "Logs:\n{}", logs);
}
