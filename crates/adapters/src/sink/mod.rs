// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Concrete sinks

#[cfg(any(test, feature = "test-support"))]
mod fake;
mod json;
mod log;

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeSink, SinkCall};
pub use json::JsonLinesSink;
pub use log::LogSink;
