// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::sink::SinkRef;
use crate::test_support::RecordingSink;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

fn memory() -> Query {
    Query::parse("java.lang:type=Memory")
        .unwrap()
        .with_attribute("HeapMemoryUsage")
}

#[test]
fn queries_differing_only_in_sinks_are_equal() {
    let a: SinkRef = RecordingSink::new("a");
    let b: SinkRef = RecordingSink::new("b");
    let q1 = memory().with_sink(a);
    let q2 = memory().with_sink(b);
    assert_eq!(q1, q2);

    let set: HashSet<Query> = [q1, q2].into_iter().collect();
    assert_eq!(set.len(), 1);
}

#[test]
fn alias_and_keys_are_part_of_query_identity() {
    assert_ne!(memory(), memory().with_alias("mem"));
    assert_ne!(memory(), memory().with_keys(["used"]));
    assert_ne!(memory(), memory().with_attribute("NonHeapMemoryUsage"));
}

#[test]
fn with_sink_skips_the_same_sink_twice() {
    let a: SinkRef = RecordingSink::new("a");
    let q = memory().with_sink(Arc::clone(&a)).with_sink(a);
    assert_eq!(q.sinks().len(), 1);
}

#[test]
fn target_merges_equal_queries_and_unions_sinks() {
    let a: SinkRef = RecordingSink::new("a");
    let b: SinkRef = RecordingSink::new("b");
    let target = Target::remote("db1", 9999)
        .with_query(memory().with_sink(Arc::clone(&a)))
        .with_query(memory().with_sink(Arc::clone(&b)))
        .with_query(memory().with_sink(a));

    assert_eq!(target.queries().len(), 1);
    let names: Vec<&str> = target.queries()[0].sinks().iter().map(|s| s.name()).collect();
    assert_eq!(names, vec!["a", "b"]);
}

#[test]
fn target_identity_defaults_to_host_and_port() {
    let target = Target::remote("db1", 9999);
    assert_eq!(target.id().as_str(), "db1:9999");
    assert_eq!(target.to_string(), "db1:9999");

    let aliased = target.with_alias("orders-db");
    assert_eq!(aliased.id().as_str(), "orders-db");
    assert_eq!(aliased.to_string(), "orders-db (db1:9999)");
}

#[test]
fn same_identity_ignores_queries_and_period() {
    let a = Target::remote("db1", 9999).with_query(memory());
    let b = Target::remote("db1", 9999).with_run_period(Duration::from_secs(5));
    assert!(a.same_identity(&b));
    assert!(!a.same_identity(&Target::remote("db1", 9998)));
    assert!(!a.same_identity(&Target::local()));
}

#[test]
fn credentials_are_masked_in_debug_output() {
    let target = Target::remote("db1", 9999).with_credentials("monitor", "hunter2");
    let debug = format!("{:?}", target);
    assert!(debug.contains("monitor"));
    assert!(!debug.contains("hunter2"));
}

#[test]
fn local_target_ignores_credentials() {
    let target = Target::local().with_credentials("u", "p");
    assert!(target.is_local());
    assert_eq!(target.endpoint(), &Endpoint::Local);
}

#[test]
fn query_display_shows_alias_and_attributes() {
    let q = memory().with_alias("mem").with_attribute("NonHeapMemoryUsage");
    assert_eq!(
        q.to_string(),
        "java.lang:type=Memory as mem [HeapMemoryUsage,NonHeapMemoryUsage]"
    );
}

#[test]
fn map_values_keeps_metadata() {
    let mut values = std::collections::BTreeMap::new();
    values.insert("used".to_string(), Value::Integer(4));
    values.insert("max".to_string(), Value::Bool(true));
    let original = QueryResult {
        epoch_ms: 42,
        attribute: "HeapMemoryUsage".to_string(),
        class_name: "MemoryImpl".to_string(),
        domain: "java.lang".to_string(),
        alias: Some("mem".to_string()),
        type_name: "type=Memory".to_string(),
        values,
    };
    let mapped = original.map_values(|v| match v {
        Value::Integer(i) => Value::Integer(i * 2),
        other => other,
    });
    assert_eq!(mapped.values["used"], Value::Integer(8));
    assert_eq!(mapped.values["max"], Value::Bool(true));
    assert_eq!(mapped.epoch_ms, 42);
    assert_eq!(mapped.alias.as_deref(), Some("mem"));
}
