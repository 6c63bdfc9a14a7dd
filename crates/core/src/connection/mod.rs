// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connections to management endpoints
//!
//! A [`Connection`] answers three questions about an endpoint: which
//! objects match a pattern, what an object looks like, and what its
//! attributes currently hold. Remote connections are borrowed from a
//! [`ConnectionProvider`], normally a [`KeyedConnectionPool`].

mod pool;

pub use pool::{KeyedConnectionPool, PooledConnection};

use crate::model::{Attribute, Endpoint, ObjectInfo, ObjectName, ObjectPattern};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors from connecting to or reading an endpoint
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("timed out after {timeout:?} waiting for a connection to {endpoint}")]
    BorrowTimeout { endpoint: String, timeout: Duration },
    #[error("cannot connect to {endpoint}: {message}")]
    Connect { endpoint: String, message: String },
    #[error("query failed: {0}")]
    Query(String),
    #[error("connection pool is closed")]
    Closed,
    #[error("no local endpoint is available in this process")]
    LocalUnavailable,
}

/// An open session with an endpoint
#[async_trait]
pub trait Connection: Send + Sync {
    /// Concrete names of the objects matching `pattern`
    async fn query_names(&self, pattern: &ObjectPattern)
        -> Result<Vec<ObjectName>, ConnectionError>;

    async fn object_info(&self, name: &ObjectName) -> Result<ObjectInfo, ConnectionError>;

    /// Read the named attributes; unknown attributes are left out
    async fn attributes(
        &self,
        name: &ObjectName,
        attributes: &[String],
    ) -> Result<Vec<Attribute>, ConnectionError>;

    /// Checked before an idle connection is reused
    async fn is_valid(&self) -> bool {
        true
    }
}

/// Opens new connections
#[async_trait]
pub trait ConnectionFactory: Send + Sync + 'static {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Box<dyn Connection>, ConnectionError>;
}

/// Hands out connections for the duration of one query execution
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    async fn borrow(&self, endpoint: &Endpoint) -> Result<PooledConnection, ConnectionError>;
}

#[async_trait]
impl<C: Connection + ?Sized> Connection for std::sync::Arc<C> {
    async fn query_names(
        &self,
        pattern: &ObjectPattern,
    ) -> Result<Vec<ObjectName>, ConnectionError> {
        (**self).query_names(pattern).await
    }

    async fn object_info(&self, name: &ObjectName) -> Result<ObjectInfo, ConnectionError> {
        (**self).object_info(name).await
    }

    async fn attributes(
        &self,
        name: &ObjectName,
        attributes: &[String],
    ) -> Result<Vec<Attribute>, ConnectionError> {
        (**self).attributes(name, attributes).await
    }

    async fn is_valid(&self) -> bool {
        (**self).is_valid().await
    }
}
