// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! jx daemon (jxd)
//!
//! Polls the configured targets until SIGTERM/SIGINT. SIGHUP re-reads
//! the configuration file and swaps in the new target list.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::path::PathBuf;
use std::time::Duration;

use jx_adapters::NoOpConnectionFactory;
use jx_daemon::config::LoggingConfig;
use jx_daemon::{startup, DaemonConfig, ExtraSinks, LifecycleError};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

/// How often pool statistics on the in-process endpoint are refreshed
const STATS_INTERVAL: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = match std::env::args().nth(1) {
        Some(path) => PathBuf::from(path),
        None => std::env::current_dir()?.join("jxd.toml"),
    };

    let config = DaemonConfig::load(&config_path)?;
    let _log_guard = setup_logging(&config.logging)?;

    info!("Starting jxd with {}", config_path.display());

    let mut daemon = match startup(config, NoOpConnectionFactory::new(), ExtraSinks::new()).await {
        Ok(d) => d,
        Err(e) => {
            error!("Failed to start daemon: {}", e);
            return Err(e.into());
        }
    };

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sighup = signal(SignalKind::hangup())?;
    let mut stats = tokio::time::interval(STATS_INTERVAL);

    info!("Daemon ready");

    loop {
        tokio::select! {
            _ = stats.tick() => daemon.publish_stats(),

            _ = sighup.recv() => {
                info!("Received SIGHUP, reloading {}", config_path.display());
                match DaemonConfig::load(&config_path) {
                    Ok(config) => {
                        if let Err(e) = daemon.reload(config).await {
                            error!("Reload failed: {}", e);
                        }
                    }
                    Err(e) => error!("Reload failed, keeping current configuration: {}", e),
                }
            }

            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down...");
                break;
            }

            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down...");
                break;
            }
        }
    }

    daemon.shutdown().await?;
    info!("Daemon stopped");
    Ok(())
}

fn setup_logging(
    config: &LoggingConfig,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let default_level = config.level.as_deref().unwrap_or("info");
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (writer, guard) = match &config.file {
        Some(path) => {
            let dir = match path.parent() {
                Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
                _ => PathBuf::from("."),
            };
            std::fs::create_dir_all(&dir)?;
            let file_name = path.file_name().ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("log file {} has no file name", path.display()),
                )
            })?;
            tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name))
        }
        None => tracing_appender::non_blocking(std::io::stdout()),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer))
        .init();

    Ok(guard)
}
