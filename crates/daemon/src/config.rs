// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration file
//!
//! ```toml
//! continue_on_error = false
//!
//! [scheduler]
//! run_period = "60s"
//! pool_size = 10
//!
//! [sinks.console]
//! kind = "stdout"
//! max_batch_size = 100
//!
//! [[targets]]
//! host = "db1"
//! port = 9999
//! sinks = ["console"]
//!
//! [[targets.queries]]
//! object = "java.lang:type=Memory"
//! attributes = ["HeapMemoryUsage"]
//! ```

use jx_core::{
    ConnectionPoolConfig, Endpoint, NameError, Query, SchedulerConfig, SinkRef, Target, TargetId,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors from loading or validating the configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("target #{index} has neither a host nor local = true")]
    MissingHost { index: usize },
    #[error("target {target} has a host but no port")]
    MissingPort { target: String },
    #[error("target {target}: query #{index} has no object pattern")]
    MissingObject { target: String, index: usize },
    #[error("target {target}: bad object pattern: {source}")]
    BadPattern {
        target: String,
        #[source]
        source: NameError,
    },
    #[error("target {target} refers to unknown sink {sink:?}")]
    UnknownSink { target: String, sink: String },
    #[error("sink {sink}: max_batch_size must be at least 1")]
    ZeroBatchSize { sink: String },
    #[error("target {target} is configured for both {first} and {second}")]
    DuplicateTarget {
        target: String,
        first: String,
        second: String,
    },
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DaemonConfig {
    /// Skip invalid targets instead of refusing to start
    pub continue_on_error: bool,
    pub scheduler: SchedulerConfig,
    pub connections: ConnectionPoolConfig,
    pub logging: LoggingConfig,
    pub sinks: BTreeMap<String, SinkConfig>,
    pub targets: Vec<TargetConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset
    pub level: Option<String>,
    /// Log to this file instead of stdout
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    /// JSON lines on stdout
    Stdout,
    /// `info` events through the daemon's log
    Log,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SinkConfig {
    pub kind: SinkKind,
    #[serde(default)]
    pub max_batch_size: Option<usize>,
    #[serde(default)]
    pub boolean_as_number: bool,
    #[serde(default)]
    pub near_zero: bool,
    #[serde(default)]
    pub circuit_breaker: Option<BreakerConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BreakerConfig {
    /// Consecutive failures that open the circuit
    pub failure_threshold: u32,
    #[serde(with = "humantime_serde")]
    pub open_for: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            open_for: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TargetConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Poll this daemon's own in-process endpoint
    pub local: bool,
    pub alias: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(with = "humantime_serde")]
    pub run_period: Option<Duration>,
    /// Sinks for every query of this target
    pub sinks: Vec<String>,
    pub queries: Vec<QueryConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueryConfig {
    pub object: String,
    /// Empty means every attribute
    pub attributes: Vec<String>,
    pub keys: Vec<String>,
    pub alias: Option<String>,
    /// Sinks in addition to the target's
    pub sinks: Vec<String>,
}

impl DaemonConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse and check everything that does not depend on running sinks
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: DaemonConfig = toml::from_str(content)?;
        config.validate_sinks()?;
        Ok(config)
    }

    fn validate_sinks(&self) -> Result<(), ConfigError> {
        for (name, sink) in &self.sinks {
            if sink.max_batch_size == Some(0) {
                return Err(ConfigError::ZeroBatchSize { sink: name.clone() });
            }
        }
        Ok(())
    }

    /// Build the target list against the running sinks.
    ///
    /// `known` holds every sink name that may be referenced; a known sink
    /// missing from `running` failed to start and is left off its queries.
    /// Targets sharing an identity and endpoint are merged; the same
    /// identity on another endpoint is invalid. Invalid targets fail the
    /// whole list unless `continue_on_error` is set, in which case they
    /// are logged and skipped.
    pub fn build_targets(
        &self,
        known: &[&str],
        running: &BTreeMap<String, SinkRef>,
    ) -> Result<Vec<Target>, ConfigError> {
        let mut builder = jx_core::TargetListBuilder::new();
        let mut endpoints: BTreeMap<TargetId, Endpoint> = BTreeMap::new();
        for (index, target) in self.targets.iter().enumerate() {
            let built = target.build(index, known, running).and_then(|target| {
                match endpoints.get(target.id()) {
                    Some(first) if first != target.endpoint() => {
                        Err(ConfigError::DuplicateTarget {
                            target: target.id().to_string(),
                            first: first.to_string(),
                            second: target.endpoint().to_string(),
                        })
                    }
                    Some(_) => Ok(target),
                    None => {
                        endpoints.insert(target.id().clone(), target.endpoint().clone());
                        Ok(target)
                    }
                }
            });
            match built {
                Ok(target) => {
                    builder.add(target);
                }
                Err(e) if self.continue_on_error => {
                    tracing::error!(error = %e, "skipping invalid target");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(builder.build())
    }
}

impl TargetConfig {
    /// Name used in errors before the target has an identity
    fn label(&self, index: usize) -> String {
        match (&self.alias, &self.host, self.port) {
            (Some(alias), _, _) => alias.clone(),
            (None, Some(host), Some(port)) => format!("{}:{}", host, port),
            (None, Some(host), None) => host.clone(),
            _ if self.local => "local".to_string(),
            _ => format!("#{}", index),
        }
    }

    pub fn build(
        &self,
        index: usize,
        known: &[&str],
        running: &BTreeMap<String, SinkRef>,
    ) -> Result<Target, ConfigError> {
        let label = self.label(index);
        let mut target = match (&self.host, self.port) {
            _ if self.local => Target::local(),
            (Some(host), Some(port)) => Target::remote(host.clone(), port),
            (Some(_), None) => return Err(ConfigError::MissingPort { target: label }),
            (None, _) => return Err(ConfigError::MissingHost { index }),
        };
        if let Some(alias) = &self.alias {
            target = target.with_alias(alias.clone());
        }
        if let (Some(username), Some(password)) = (&self.username, &self.password) {
            target = target.with_credentials(username.clone(), password.clone());
        }
        if let Some(period) = self.run_period {
            target = target.with_run_period(period);
        }

        let referenced = self
            .sinks
            .iter()
            .chain(self.queries.iter().flat_map(|q| &q.sinks));
        for name in referenced {
            if !known.contains(&name.as_str()) {
                return Err(ConfigError::UnknownSink {
                    target: label,
                    sink: name.clone(),
                });
            }
        }

        for (qi, query) in self.queries.iter().enumerate() {
            if query.object.trim().is_empty() {
                return Err(ConfigError::MissingObject {
                    target: label,
                    index: qi,
                });
            }
            let mut built = Query::parse(query.object.trim())
                .map_err(|source| ConfigError::BadPattern {
                    target: label.clone(),
                    source,
                })?
                .with_attributes(query.attributes.iter().cloned())
                .with_keys(query.keys.iter().cloned());
            if let Some(alias) = &query.alias {
                built = built.with_alias(alias.clone());
            }
            for name in self.sinks.iter().chain(&query.sinks) {
                match running.get(name) {
                    Some(sink) => built = built.with_sink(SinkRef::clone(sink)),
                    None => tracing::warn!(
                        target_id = %label,
                        sink = %name,
                        "sink is not running, query will not write to it"
                    ),
                }
            }
            target = target.with_query(built);
        }
        Ok(target)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
