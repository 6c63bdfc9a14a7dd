// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::model::Query;
use crate::sink::SinkRef;
use crate::test_support::RecordingSink;
use std::sync::Arc;
use std::time::Duration;

fn query(object: &str) -> Query {
    Query::parse(object).unwrap()
}

#[test]
fn distinct_targets_keep_insertion_order() {
    let mut builder = TargetListBuilder::new();
    builder
        .add(Target::remote("b", 1))
        .add(Target::remote("a", 1))
        .add(Target::local());

    let ids: Vec<String> = builder.build().iter().map(|t| t.id().to_string()).collect();
    assert_eq!(ids, vec!["b:1", "a:1", "local"]);
}

#[test]
fn same_target_from_two_sources_is_merged() {
    let graphite: SinkRef = RecordingSink::new("graphite");
    let stdout: SinkRef = RecordingSink::new("stdout");
    let mut builder = TargetListBuilder::new();
    builder.add_all([
        Target::remote("db1", 9999)
            .with_run_period(Duration::from_secs(30))
            .with_query(query("java.lang:type=Memory").with_sink(Arc::clone(&graphite)))
            .with_query(query("java.lang:type=Threading")),
        Target::remote("db1", 9999)
            .with_query(query("java.lang:type=Memory").with_sink(Arc::clone(&stdout)))
            .with_query(query("java.lang:type=Memory").with_sink(graphite))
            .with_query(query("java.lang:type=Runtime")),
    ]);

    assert_eq!(builder.len(), 1);
    let targets = builder.build();
    let target = &targets[0];
    assert_eq!(target.run_period(), Some(Duration::from_secs(30)));

    let objects: Vec<&str> = target.queries().iter().map(|q| q.object().as_str()).collect();
    assert_eq!(
        objects,
        vec!["java.lang:type=Memory", "java.lang:type=Threading", "java.lang:type=Runtime"]
    );
    let sinks: Vec<&str> = target.queries()[0].sinks().iter().map(|s| s.name()).collect();
    assert_eq!(sinks, vec!["graphite", "stdout"]);
}

#[test]
fn same_id_on_a_different_endpoint_is_not_merged() {
    let mut builder = TargetListBuilder::new();
    builder
        .add(Target::remote("db1", 9999).with_alias("orders"))
        .add(Target::remote("db2", 9999).with_alias("orders"));
    assert_eq!(builder.len(), 2);
}

#[test]
fn empty_builder_builds_nothing() {
    let builder = TargetListBuilder::new();
    assert!(builder.is_empty());
    assert!(builder.build().is_empty());
}
