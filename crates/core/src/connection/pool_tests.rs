// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::FakeConnection;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Hands out clones of one shared fake and counts connects
#[derive(Clone, Default)]
struct CountingFactory {
    conn: Arc<FakeConnection>,
    connects: Arc<AtomicUsize>,
    refuse: bool,
}

#[async_trait]
impl ConnectionFactory for CountingFactory {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn Connection>, ConnectionError> {
        if self.refuse {
            return Err(ConnectionError::Connect {
                endpoint: endpoint.to_string(),
                message: "connection refused".to_string(),
            });
        }
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(Arc::clone(&self.conn)))
    }
}

fn factory() -> CountingFactory {
    CountingFactory {
        conn: Arc::new(FakeConnection::new()),
        ..CountingFactory::default()
    }
}

fn endpoint(port: u16) -> Endpoint {
    Endpoint::Remote {
        host: "db1".to_string(),
        port,
        credentials: None,
    }
}

fn pool(factory: CountingFactory, max_per_key: usize) -> KeyedConnectionPool<CountingFactory> {
    KeyedConnectionPool::new(
        factory,
        ConnectionPoolConfig {
            max_per_key,
            borrow_timeout: Duration::from_millis(50),
        },
    )
}

#[tokio::test]
async fn returned_connection_is_reused() {
    let factory = factory();
    let pool = pool(factory.clone(), 2);

    drop(pool.borrow(&endpoint(1)).await.unwrap());
    assert_eq!(pool.idle_count(&endpoint(1)), 1);
    drop(pool.borrow(&endpoint(1)).await.unwrap());

    assert_eq!(factory.connects.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn reused_connection_is_the_live_one() {
    let factory = factory();
    let pool = pool(factory.clone(), 1);

    for _ in 0..3 {
        let conn = pool.borrow(&endpoint(1)).await.unwrap();
        assert!(conn.is_valid().await);
    }
    assert_eq!(pool.idle_count(&endpoint(1)), 1);
    assert_eq!(factory.connects.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn invalidated_connection_is_not_returned() {
    let factory = factory();
    let pool = pool(factory.clone(), 2);

    let mut conn = pool.borrow(&endpoint(1)).await.unwrap();
    conn.invalidate();
    drop(conn);

    assert_eq!(pool.idle_count(&endpoint(1)), 0);
    drop(pool.borrow(&endpoint(1)).await.unwrap());
    assert_eq!(factory.connects.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn invalid_idle_connection_is_replaced() {
    let factory = factory();
    let pool = pool(factory.clone(), 2);

    drop(pool.borrow(&endpoint(1)).await.unwrap());
    factory.conn.set_valid(false);
    let _conn = pool.borrow(&endpoint(1)).await.unwrap();

    assert_eq!(factory.connects.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn borrow_times_out_when_key_is_exhausted() {
    let pool = pool(factory(), 1);
    let _held = pool.borrow(&endpoint(1)).await.unwrap();

    let err = pool.borrow(&endpoint(1)).await.err().unwrap();
    assert!(matches!(err, ConnectionError::BorrowTimeout { .. }));

    // other keys are unaffected
    assert!(pool.borrow(&endpoint(2)).await.is_ok());
}

#[tokio::test]
async fn connect_failure_releases_the_slot() {
    let mut refusing = factory();
    refusing.refuse = true;
    let pool = pool(refusing, 1);

    for _ in 0..2 {
        let err = pool.borrow(&endpoint(1)).await.err().unwrap();
        assert!(matches!(err, ConnectionError::Connect { .. }));
    }
}

#[tokio::test]
async fn evict_closes_the_slot() {
    let factory = factory();
    let pool = pool(factory.clone(), 1);
    let held = pool.borrow(&endpoint(1)).await.unwrap();

    pool.evict(&endpoint(1));
    drop(held);

    assert_eq!(pool.idle_count(&endpoint(1)), 0);
    drop(pool.borrow(&endpoint(1)).await.unwrap());
    assert_eq!(factory.connects.load(Ordering::SeqCst), 2);
}
