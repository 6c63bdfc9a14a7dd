// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Monitored targets and how to reach them

use super::Query;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Identity of a target: its alias, or `host:port`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetId(pub String);

impl TargetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TargetId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TargetId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Login for a remote endpoint
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Where a target lives. Doubles as the connection pool key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// The endpoint embedded in this process; never pooled
    Local,
    Remote {
        host: String,
        port: u16,
        credentials: Option<Credentials>,
    },
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Local => write!(f, "local"),
            Endpoint::Remote { host, port, .. } => write!(f, "{}:{}", host, port),
        }
    }
}

/// A monitored endpoint and the queries to run against it
#[derive(Debug, Clone)]
pub struct Target {
    id: TargetId,
    endpoint: Endpoint,
    run_period: Option<Duration>,
    queries: Vec<Query>,
}

impl Target {
    pub fn remote(host: impl Into<String>, port: u16) -> Self {
        let host = host.into();
        Self {
            id: TargetId(format!("{}:{}", host, port)),
            endpoint: Endpoint::Remote {
                host,
                port,
                credentials: None,
            },
            run_period: None,
            queries: Vec::new(),
        }
    }

    pub fn local() -> Self {
        Self {
            id: TargetId::new("local"),
            endpoint: Endpoint::Local,
            run_period: None,
            queries: Vec::new(),
        }
    }

    /// Replace the `host:port` identity with a logical alias
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.id = TargetId(alias.into());
        self
    }

    /// Attach credentials; ignored for local targets
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        if let Endpoint::Remote { credentials, .. } = &mut self.endpoint {
            *credentials = Some(Credentials {
                username: username.into(),
                password: password.into(),
            });
        }
        self
    }

    pub fn with_run_period(mut self, period: Duration) -> Self {
        self.run_period = Some(period);
        self
    }

    /// Add a query, merging it into an equal query if one is already present
    pub fn with_query(mut self, query: Query) -> Self {
        self.add_query(query);
        self
    }

    pub fn with_queries(mut self, queries: impl IntoIterator<Item = Query>) -> Self {
        for query in queries {
            self.add_query(query);
        }
        self
    }

    pub(crate) fn add_query(&mut self, query: Query) {
        match self.queries.iter_mut().find(|q| **q == query) {
            Some(existing) => existing.absorb_sinks(&query),
            None => self.queries.push(query),
        }
    }

    pub fn id(&self) -> &TargetId {
        &self.id
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn is_local(&self) -> bool {
        matches!(self.endpoint, Endpoint::Local)
    }

    /// Configured polling period, if any
    pub fn run_period(&self) -> Option<Duration> {
        self.run_period
    }

    pub fn queries(&self) -> &[Query] {
        &self.queries
    }

    /// Same id and same endpoint; queries are not compared
    pub fn same_identity(&self, other: &Target) -> bool {
        self.id == other.id && self.endpoint == other.endpoint
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.id.as_str() == self.endpoint.to_string() {
            write!(f, "{}", self.id)
        } else {
            write!(f, "{} ({})", self.id, self.endpoint)
        }
    }
}
