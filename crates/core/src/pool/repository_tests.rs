// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::pool::{CountingPoolMetrics, NoOpPoolMetrics};

fn config(topology: PoolTopology) -> SchedulerConfig {
    SchedulerConfig {
        pool_size: 1,
        backlog_capacity: 2,
        topology,
        drain_timeout: Duration::from_secs(1),
        ..SchedulerConfig::default()
    }
}

fn repository(topology: PoolTopology) -> Arc<dyn ExecutorRepository> {
    build_repository(&config(topology), Arc::new(NoOpPoolMetrics)).unwrap()
}

#[tokio::test]
async fn shared_topology_hands_out_one_pool() {
    let repo = repository(PoolTopology::Shared);
    let a = repo.executor_for(&Target::remote("a", 1)).unwrap();
    let b = repo.executor_for(&Target::remote("b", 1)).unwrap();

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(a.name(), "query");
    assert_eq!(repo.pools().len(), 1);

    // removing a target leaves the shared pool running
    repo.remove(&TargetId::new("a:1")).await;
    assert!(!a.is_shut_down());
}

#[tokio::test]
async fn per_target_pools_are_created_on_put_and_named_by_target() {
    let repo = repository(PoolTopology::PerTarget);
    assert!(repo.pools().is_empty());

    let a = repo.put(&Target::remote("a", 1)).unwrap();
    let again = repo.put(&Target::remote("a", 1)).unwrap();
    let b = repo.put(&Target::remote("b", 1).with_alias("beta")).unwrap();

    assert!(Arc::ptr_eq(&a, &again));
    assert!(!Arc::ptr_eq(&a, &b));
    let names: Vec<String> = repo.pools().iter().map(|p| p.name().to_string()).collect();
    assert_eq!(names, vec!["query-a:1", "query-beta"]);
    assert!(Arc::ptr_eq(&repo.executor_for(&Target::remote("a", 1)).unwrap(), &a));
}

#[tokio::test]
async fn per_target_lookup_never_creates_a_pool() {
    let repo = repository(PoolTopology::PerTarget);
    let a = Target::remote("a", 1);

    assert!(matches!(
        repo.executor_for(&a),
        Err(PoolError::Unknown { target }) if target == "a:1"
    ));
    assert!(repo.pools().is_empty());

    repo.put(&a).unwrap();
    repo.remove(a.id()).await;
    assert!(matches!(repo.executor_for(&a), Err(PoolError::Unknown { .. })));
    assert!(repo.pools().is_empty());
}

#[tokio::test]
async fn removing_a_target_forgets_its_counters() {
    let metrics = Arc::new(CountingPoolMetrics::new());
    let repo = build_repository(&config(PoolTopology::PerTarget), metrics.clone()).unwrap();
    let pool = repo.put(&Target::remote("a", 1)).unwrap();
    pool.submit(async {}).unwrap().join().await;
    assert_eq!(metrics.counters("query-a:1").submitted, 1);

    repo.remove(&TargetId::new("a:1")).await;

    assert!(metrics.snapshot().is_empty());
}

#[tokio::test]
async fn removing_a_target_drains_its_pool() {
    let repo = repository(PoolTopology::PerTarget);
    let pool = repo.put(&Target::remote("a", 1)).unwrap();

    repo.remove(&TargetId::new("a:1")).await;

    assert!(pool.is_shut_down());
    assert!(repo.pools().is_empty());
    // unknown ids are ignored
    repo.remove(&TargetId::new("nope")).await;
}

#[tokio::test]
async fn shutdown_closes_every_pool() {
    for topology in [PoolTopology::Shared, PoolTopology::PerTarget] {
        let repo = repository(topology);
        let pool = repo.put(&Target::local()).unwrap();
        repo.shutdown().await;

        assert!(pool.is_shut_down());
        assert!(matches!(
            repo.executor_for(&Target::local()),
            Err(PoolError::ShutDown { .. })
        ));
        assert!(matches!(
            repo.put(&Target::local()),
            Err(PoolError::ShutDown { .. })
        ));
    }
}
