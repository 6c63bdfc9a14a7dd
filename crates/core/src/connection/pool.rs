// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{Connection, ConnectionError, ConnectionFactory, ConnectionProvider};
use crate::config::ConnectionPoolConfig;
use crate::model::{Attribute, Endpoint, ObjectInfo, ObjectName, ObjectPattern};
use async_trait::async_trait;
use std::collections::HashMap;
use std::ops::Deref;
use std::sync::{Arc, Mutex};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

struct Slot {
    permits: Arc<Semaphore>,
    idle: Mutex<Vec<Box<dyn Connection>>>,
}

impl Slot {
    fn new(capacity: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            idle: Mutex::new(Vec::new()),
        }
    }

    fn pop_idle(&self) -> Option<Box<dyn Connection>> {
        self.idle.lock().unwrap_or_else(|e| e.into_inner()).pop()
    }
}

/// Connection pool keyed by endpoint.
///
/// At most `max_per_key` connections per endpoint are out at once; extra
/// borrowers wait up to `borrow_timeout`. Idle connections are validated
/// before reuse and dropped if invalid.
pub struct KeyedConnectionPool<F: ConnectionFactory> {
    factory: F,
    config: ConnectionPoolConfig,
    slots: Mutex<HashMap<Endpoint, Arc<Slot>>>,
}

impl<F: ConnectionFactory> KeyedConnectionPool<F> {
    pub fn new(factory: F, config: ConnectionPoolConfig) -> Self {
        Self {
            factory,
            config,
            slots: Mutex::new(HashMap::new()),
        }
    }

    fn slot(&self, endpoint: &Endpoint) -> Arc<Slot> {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(
            slots
                .entry(endpoint.clone())
                .or_insert_with(|| Arc::new(Slot::new(self.config.max_per_key.max(1)))),
        )
    }

    async fn checkout(
        &self,
        endpoint: &Endpoint,
        slot: Arc<Slot>,
    ) -> Result<PooledConnection, ConnectionError> {
        let permit = Arc::clone(&slot.permits)
            .acquire_owned()
            .await
            .map_err(|_| ConnectionError::Closed)?;

        while let Some(conn) = slot.pop_idle() {
            if conn.is_valid().await {
                return Ok(PooledConnection::pooled(conn, slot, permit));
            }
            debug!(%endpoint, "discarding invalid idle connection");
        }

        debug!(%endpoint, "opening connection");
        let conn = self.factory.connect(endpoint).await?;
        Ok(PooledConnection::pooled(conn, slot, permit))
    }

    /// Drop idle connections for `endpoint` and forget its slot.
    /// Borrowed connections are discarded when returned.
    pub fn evict(&self, endpoint: &Endpoint) {
        let removed = self
            .slots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(endpoint);
        if let Some(slot) = removed {
            slot.permits.close();
            slot.idle.lock().unwrap_or_else(|e| e.into_inner()).clear();
        }
    }

    pub fn idle_count(&self, endpoint: &Endpoint) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(endpoint)
            .map(|slot| slot.idle.lock().unwrap_or_else(|e| e.into_inner()).len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl<F: ConnectionFactory> ConnectionProvider for KeyedConnectionPool<F> {
    async fn borrow(&self, endpoint: &Endpoint) -> Result<PooledConnection, ConnectionError> {
        let slot = self.slot(endpoint);
        let timeout = self.config.borrow_timeout;
        match tokio::time::timeout(timeout, self.checkout(endpoint, slot)).await {
            Ok(result) => result,
            Err(_) => Err(ConnectionError::BorrowTimeout {
                endpoint: endpoint.to_string(),
                timeout,
            }),
        }
    }
}

/// A borrowed connection. Goes back to its pool on drop unless
/// [`invalidate`](Self::invalidate) was called.
pub struct PooledConnection {
    conn: Box<dyn Connection>,
    home: Option<(Arc<Slot>, OwnedSemaphorePermit)>,
    invalid: bool,
}

impl PooledConnection {
    fn pooled(conn: Box<dyn Connection>, slot: Arc<Slot>, permit: OwnedSemaphorePermit) -> Self {
        Self {
            conn,
            home: Some((slot, permit)),
            invalid: false,
        }
    }

    /// A connection that belongs to no pool and is closed on drop
    pub fn unpooled(conn: Box<dyn Connection>) -> Self {
        Self {
            conn,
            home: None,
            invalid: false,
        }
    }

    /// Discard instead of returning to the pool
    pub fn invalidate(&mut self) {
        self.invalid = true;
    }
}

impl Deref for PooledConnection {
    type Target = dyn Connection;

    fn deref(&self) -> &Self::Target {
        self.conn.as_ref()
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        let Some((slot, permit)) = self.home.take() else {
            return;
        };
        if !self.invalid && !slot.permits.is_closed() {
            let conn = std::mem::replace(&mut self.conn, Box::new(Released));
            slot.idle.lock().unwrap_or_else(|e| e.into_inner()).push(conn);
        }
        drop(permit);
    }
}

/// Left behind in a [`PooledConnection`] whose connection went back to
/// the idle stack
struct Released;

#[async_trait]
impl Connection for Released {
    async fn query_names(
        &self,
        _pattern: &ObjectPattern,
    ) -> Result<Vec<ObjectName>, ConnectionError> {
        Err(ConnectionError::Closed)
    }

    async fn object_info(&self, _name: &ObjectName) -> Result<ObjectInfo, ConnectionError> {
        Err(ConnectionError::Closed)
    }

    async fn attributes(
        &self,
        _name: &ObjectName,
        _attributes: &[String],
    ) -> Result<Vec<Attribute>, ConnectionError> {
        Err(ConnectionError::Closed)
    }

    async fn is_valid(&self) -> bool {
        false
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
