// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::config::SchedulerConfig;
use crate::model::Query;
use crate::pool::{build_repository, NoOpPoolMetrics};
use crate::test_support::{connection_pool, memory_object, RecordingSink};
use tokio::sync::Semaphore;

fn executors(pool_size: usize, backlog_capacity: usize) -> Arc<dyn ExecutorRepository> {
    let config = SchedulerConfig {
        pool_size,
        backlog_capacity,
        ..SchedulerConfig::default()
    };
    build_repository(&config, Arc::new(NoOpPoolMetrics)).unwrap()
}

fn processor() -> Arc<QueryProcessor> {
    Arc::new(QueryProcessor::new(connection_pool(Arc::new(memory_object()))))
}

fn target(sink: &Arc<RecordingSink>, queries: usize) -> Arc<Target> {
    let attributes = ["ObjectPendingFinalizationCount", "Verbose"];
    let target = (0..queries).fold(Target::remote("db1", 9999), |t, i| {
        t.with_query(
            Query::parse("java.lang:type=Memory")
                .unwrap()
                .with_alias(format!("q{}", i))
                .with_attribute(attributes[i % 2])
                .with_sink(sink.clone()),
        )
    });
    Arc::new(target)
}

#[tokio::test]
async fn tick_submits_every_query() {
    let sink = RecordingSink::new("rec");
    let executors = executors(2, 10);
    let dispatcher = TargetDispatcher::new(target(&sink, 3), Arc::clone(&executors), processor());

    let report = dispatcher.tick().unwrap();
    executors.shutdown().await;

    assert_eq!(report, TickReport { submitted: 3, rejected: 0 });
    assert_eq!(sink.writes().len(), 3);
}

#[tokio::test]
async fn saturation_skips_only_the_rejected_queries() {
    let sink = RecordingSink::new("rec");
    let executors = executors(1, 1);
    let target = target(&sink, 3);
    let pool = executors.executor_for(&target).unwrap();

    let gate = Arc::new(Semaphore::new(0));
    let held = Arc::clone(&gate);
    pool.submit(async move {
        let _ = held.acquire().await;
    })
    .unwrap();
    while pool.gauges().active == 0 {
        tokio::task::yield_now().await;
    }

    let dispatcher = TargetDispatcher::new(target, Arc::clone(&executors), processor());
    let report = dispatcher.tick().unwrap();
    assert_eq!(report, TickReport { submitted: 1, rejected: 2 });

    gate.add_permits(1);
    executors.shutdown().await;
    // the accepted query still ran
    assert_eq!(sink.writes().len(), 1);
    assert_eq!(
        sink.writes()[0].query,
        "java.lang:type=Memory as q0 [ObjectPendingFinalizationCount]"
    );
}

#[tokio::test]
async fn tick_fails_once_the_pool_is_gone() {
    let sink = RecordingSink::new("rec");
    let executors = executors(1, 1);
    executors.shutdown().await;
    let dispatcher = TargetDispatcher::new(target(&sink, 1), executors, processor());

    let err = dispatcher.tick().unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Pool {
            source: PoolError::ShutDown { .. },
            ..
        }
    ));

    // run_tick logs and keeps counting
    dispatcher.run_tick();
    dispatcher.run_tick();
    assert_eq!(dispatcher.ticks(), 2);
}

#[tokio::test]
async fn target_without_queries_submits_nothing() {
    let executors = executors(1, 1);
    let dispatcher = TargetDispatcher::new(
        Arc::new(Target::remote("db1", 9999)),
        executors,
        processor(),
    );
    assert_eq!(dispatcher.tick().unwrap(), TickReport::default());
}

#[test]
fn error_chain_includes_causes() {
    let err = DispatchError::Pool {
        target: TargetId::new("db1:9999"),
        source: PoolError::ShutDown {
            pool: "query".to_string(),
        },
    };
    assert_eq!(
        error_chain(&err),
        "no worker pool for db1:9999: pool query is shut down"
    );
}
