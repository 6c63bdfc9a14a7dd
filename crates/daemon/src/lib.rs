// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! jx-daemon: composition root for the polling daemon
//!
//! Reads the TOML configuration, builds sinks and targets, wires the
//! scheduler to the worker pools and connection pool, and publishes the
//! daemon's own pool statistics on the in-process endpoint.

pub mod config;
pub mod lifecycle;
pub mod sinks;
pub mod stats;

pub use config::{ConfigError, DaemonConfig};
pub use lifecycle::{startup, Daemon, ExtraSinks, LifecycleError};
