// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, reload, shutdown.

use std::collections::BTreeMap;
use std::sync::Arc;

use jx_adapters::{InProcessServer, TracedConnectionFactory};
use jx_core::{
    build_repository, ConnectionFactory, CountingPoolMetrics, ExecutorRepository,
    KeyedConnectionPool, PoolError, QueryProcessor, ReloadReport, Scheduler, Sink, SinkRef, Target,
    Timer, TimerError, TokioTimer,
};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::{ConfigError, DaemonConfig};
use crate::sinks::build_sink;
use crate::stats::publish_pools;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Worker pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("Timer error: {0}")]
    Timer(#[from] TimerError),

    #[error("Failed to schedule {failed} target(s)")]
    Schedule { failed: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Sinks supplied by the embedding program rather than the configuration
/// file. They are started once and live until shutdown; a configured sink
/// with the same name takes precedence.
pub type ExtraSinks = BTreeMap<String, SinkRef>;

type SinkMap = BTreeMap<String, SinkRef>;

/// Running daemon
pub struct Daemon {
    config: DaemonConfig,
    scheduler: Scheduler,
    local: Arc<InProcessServer>,
    metrics: Arc<CountingPoolMetrics>,
    /// Every extra sink name, including ones that failed to start
    extra_names: Vec<String>,
    extra: SinkMap,
    configured: SinkMap,
}

/// Start the daemon: start sinks, build and validate targets, then schedule
pub async fn startup<F: ConnectionFactory>(
    config: DaemonConfig,
    factory: F,
    extra_sinks: ExtraSinks,
) -> Result<Daemon, LifecycleError> {
    let metrics = Arc::new(CountingPoolMetrics::new());
    let executors = build_repository(&config.scheduler, Arc::clone(&metrics) as _)?;
    let timer: Arc<dyn Timer> = Arc::new(TokioTimer::new()?);
    let local = Arc::new(InProcessServer::new());

    let connections = Arc::new(KeyedConnectionPool::new(
        TracedConnectionFactory::new(factory),
        config.connections.clone(),
    ));
    let processor = QueryProcessor::new(connections).with_local(Arc::clone(&local) as _);

    let extra_names: Vec<String> = extra_sinks.keys().cloned().collect();
    let extra = start_sinks(extra_sinks).await;
    let configured = start_sinks(configured_sinks(&config)).await;
    let targets = match build_targets(&config, &extra_names, &running(&extra, &configured)) {
        Ok(targets) => targets,
        Err(e) => {
            stop_sinks(&configured).await;
            stop_sinks(&extra).await;
            executors.shutdown().await;
            return Err(e.into());
        }
    };

    let scheduler = Scheduler::new(
        config.scheduler.clone(),
        timer,
        executors,
        Arc::new(processor),
    );

    let mut failed = 0;
    for target in targets {
        let id = target.id().clone();
        if let Err(e) = scheduler.schedule(target) {
            error!(target_id = %id, error = %e, "failed to schedule target");
            failed += 1;
        }
    }
    if failed > 0 && !config.continue_on_error {
        scheduler.shutdown().await;
        stop_sinks(&configured).await;
        stop_sinks(&extra).await;
        return Err(LifecycleError::Schedule { failed });
    }

    let daemon = Daemon {
        config,
        scheduler,
        local,
        metrics,
        extra_names,
        extra,
        configured,
    };
    daemon.publish_stats();

    info!(
        targets = daemon.scheduler.jobs().len(),
        sinks = daemon.sink_names().len(),
        "daemon started"
    );
    Ok(daemon)
}

impl Daemon {
    pub fn config(&self) -> &DaemonConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// The endpoint `local` targets read from
    pub fn local(&self) -> &Arc<InProcessServer> {
        &self.local
    }

    pub fn metrics(&self) -> &Arc<CountingPoolMetrics> {
        &self.metrics
    }

    /// Names of the sinks that started successfully
    pub fn sink_names(&self) -> Vec<String> {
        running(&self.extra, &self.configured).into_keys().collect()
    }

    /// Refresh the pool objects on the in-process endpoint
    pub fn publish_stats(&self) {
        publish_pools(&self.local, self.scheduler.executors().as_ref(), &self.metrics);
    }

    /// Swap in a new target list and configured sinks.
    ///
    /// New sinks are started and the new targets validated first; if that
    /// fails the running configuration is left untouched. Scheduler,
    /// connection and logging settings only take effect on restart.
    pub async fn reload(&mut self, config: DaemonConfig) -> Result<ReloadReport, LifecycleError> {
        if config.scheduler != self.config.scheduler || config.connections != self.config.connections
        {
            warn!("scheduler and connection settings changed; restart to apply them");
        }

        let configured = start_sinks(configured_sinks(&config)).await;
        let sinks = running(&self.extra, &configured);
        let targets = match build_targets(&config, &self.extra_names, &sinks) {
            Ok(targets) => targets,
            Err(e) => {
                stop_sinks(&configured).await;
                return Err(e.into());
            }
        };

        let report = self.scheduler.reload(targets).await;
        let old = std::mem::replace(&mut self.configured, configured);
        stop_sinks(&old).await;
        self.config = config;
        self.publish_stats();

        if !report.failed.is_empty() && !self.config.continue_on_error {
            return Err(LifecycleError::Schedule {
                failed: report.failed.len(),
            });
        }
        Ok(report)
    }

    /// Unschedule everything, stop the timer, drain the pools, stop sinks
    pub async fn shutdown(&mut self) -> Result<(), LifecycleError> {
        info!("Shutting down daemon...");

        let unscheduled = self.scheduler.unschedule_all();
        self.scheduler.stop();
        self.scheduler.executors().shutdown().await;
        stop_sinks(&std::mem::take(&mut self.configured)).await;
        stop_sinks(&std::mem::take(&mut self.extra)).await;

        info!(unscheduled, "Daemon shutdown complete");
        Ok(())
    }
}

fn configured_sinks(config: &DaemonConfig) -> SinkMap {
    config
        .sinks
        .iter()
        .map(|(name, sink)| (name.clone(), build_sink(name, sink)))
        .collect()
}

fn running(extra: &SinkMap, configured: &SinkMap) -> SinkMap {
    let mut all = extra.clone();
    all.extend(configured.iter().map(|(k, v)| (k.clone(), SinkRef::clone(v))));
    all
}

/// Start each sink; sinks that fail to start are left out
async fn start_sinks(candidates: SinkMap) -> SinkMap {
    let mut started = SinkMap::new();
    for (name, sink) in candidates {
        match sink.start().await {
            Ok(()) => {
                started.insert(name, sink);
            }
            Err(e) => error!(sink = %name, error = %e, "sink failed to start, dropping it"),
        }
    }
    started
}

async fn stop_sinks(sinks: &SinkMap) {
    for (name, sink) in sinks {
        if let Err(e) = sink.stop().await {
            warn!(sink = %name, error = %e, "sink failed to stop");
        }
    }
}

fn build_targets(
    config: &DaemonConfig,
    extra_names: &[String],
    running: &SinkMap,
) -> Result<Vec<Target>, ConfigError> {
    let known: Vec<&str> = config
        .sinks
        .keys()
        .chain(extra_names)
        .map(String::as_str)
        .collect();
    config.build_targets(&known, running)
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
