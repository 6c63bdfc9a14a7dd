// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Running one query against one target and delivering the results

use crate::connection::{Connection, ConnectionError, ConnectionProvider, PooledConnection};
use crate::flatten::ResultFlattener;
use crate::model::{ObjectName, Query, QueryResult, Target, TargetId};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from executing a query
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("cannot reach {target}: {source}")]
    Connect {
        target: TargetId,
        #[source]
        source: ConnectionError,
    },
    #[error("query {query} on {target} failed: {source}")]
    Read {
        target: TargetId,
        query: String,
        #[source]
        source: ConnectionError,
    },
}

/// What happened to the results of one execution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Non-empty batches produced (one per matched object)
    pub batches: usize,
    pub results: usize,
    /// Successful sink writes
    pub delivered: usize,
    /// Names of sinks whose write failed, once per failure
    pub failed: Vec<String>,
}

impl DeliveryReport {
    fn merge(&mut self, other: DeliveryReport) {
        self.batches += other.batches;
        self.results += other.results;
        self.delivered += other.delivered;
        self.failed.extend(other.failed);
    }
}

/// Executes queries and hands their results to the query's sinks
pub struct QueryProcessor {
    connections: Arc<dyn ConnectionProvider>,
    local: Option<Arc<dyn Connection>>,
}

impl QueryProcessor {
    pub fn new(connections: Arc<dyn ConnectionProvider>) -> Self {
        Self {
            connections,
            local: None,
        }
    }

    /// Connection used for targets flagged local, bypassing the pool
    pub fn with_local(mut self, local: Arc<dyn Connection>) -> Self {
        self.local = Some(local);
        self
    }

    async fn connect(&self, target: &Target) -> Result<PooledConnection, ConnectionError> {
        if target.is_local() {
            return match &self.local {
                Some(local) => Ok(PooledConnection::unpooled(Box::new(Arc::clone(local)))),
                None => Err(ConnectionError::LocalUnavailable),
            };
        }
        self.connections.borrow(target.endpoint()).await
    }

    /// Read the query's attributes from every matching object.
    ///
    /// Returns one batch per matched object, in the order the endpoint
    /// reported them. The connection goes back to its pool before this
    /// returns; after a read failure it is discarded instead.
    pub async fn execute(
        &self,
        target: &Target,
        query: &Query,
    ) -> Result<Vec<Vec<QueryResult>>, ExecuteError> {
        let mut conn = self
            .connect(target)
            .await
            .map_err(|source| ExecuteError::Connect {
                target: target.id().clone(),
                source,
            })?;

        let outcome = read_all(&*conn, query).await;
        match outcome {
            Ok(batches) => Ok(batches),
            Err(source) => {
                conn.invalidate();
                Err(ExecuteError::Read {
                    target: target.id().clone(),
                    query: query.to_string(),
                    source,
                })
            }
        }
    }

    /// Write `results` to each of the query's sinks in turn.
    ///
    /// A sink that fails or panics is logged and skipped; the remaining
    /// sinks still get the batch.
    pub async fn deliver(
        &self,
        target: &Target,
        query: &Query,
        results: &[QueryResult],
    ) -> DeliveryReport {
        let mut report = DeliveryReport {
            batches: 1,
            results: results.len(),
            ..DeliveryReport::default()
        };
        for sink in query.sinks() {
            let outcome = AssertUnwindSafe(sink.write(target, query, results))
                .catch_unwind()
                .await;
            match outcome {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(e)) => {
                    warn!(
                        sink = sink.name(),
                        target_id = %target.id(),
                        query = %query,
                        error = %e,
                        "sink write failed"
                    );
                    report.failed.push(sink.name().to_string());
                }
                Err(_) => {
                    warn!(
                        sink = sink.name(),
                        target_id = %target.id(),
                        query = %query,
                        "sink panicked during write"
                    );
                    report.failed.push(sink.name().to_string());
                }
            }
        }
        report
    }

    /// Execute and deliver. Empty batches are not delivered.
    pub async fn process(
        &self,
        target: &Target,
        query: &Query,
    ) -> Result<DeliveryReport, ExecuteError> {
        let batches = self.execute(target, query).await?;
        let mut report = DeliveryReport::default();
        for batch in batches.iter().filter(|b| !b.is_empty()) {
            report.merge(self.deliver(target, query, batch).await);
        }
        debug!(
            target_id = %target.id(),
            query = %query,
            results = report.results,
            delivered = report.delivered,
            "query finished"
        );
        Ok(report)
    }

    /// [`process`](Self::process) for worker tasks: errors are logged, not returned
    pub async fn run(&self, target: &Target, query: &Query) {
        if let Err(e) = self.process(target, query).await {
            warn!(target_id = %target.id(), query = %query, error = %e, "query execution failed");
        }
    }
}

async fn read_all(
    conn: &dyn Connection,
    query: &Query,
) -> Result<Vec<Vec<QueryResult>>, ConnectionError> {
    let names = conn.query_names(query.object()).await?;
    let mut batches = Vec::with_capacity(names.len());
    for name in &names {
        batches.push(read_object(conn, query, name).await?);
    }
    Ok(batches)
}

async fn read_object(
    conn: &dyn Connection,
    query: &Query,
    name: &ObjectName,
) -> Result<Vec<QueryResult>, ConnectionError> {
    let info = conn.object_info(name).await?;
    let wanted: &[String] = if query.attributes().is_empty() {
        &info.attribute_names
    } else {
        query.attributes()
    };
    if wanted.is_empty() {
        return Ok(Vec::new());
    }
    debug!(object = %name, query = %query, "reading attributes");
    let attributes = conn.attributes(name, wanted).await?;
    let epoch_ms = chrono::Utc::now().timestamp_millis();
    Ok(ResultFlattener::new(query, &info, epoch_ms).flatten(attributes))
}

#[cfg(test)]
#[path = "execution_tests.rs"]
mod tests;
