// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for external I/O: concrete sinks and the in-process endpoint

pub mod local;
pub mod sink;
pub mod traced;

#[cfg(test)]
mod test_support;

pub use local::{InProcessServer, LocalObject, NoOpConnectionFactory, ObjectSource};
pub use sink::{JsonLinesSink, LogSink};
pub use traced::{TracedConnectionFactory, TracedSink};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use local::FakeConnectionFactory;
#[cfg(any(test, feature = "test-support"))]
pub use sink::{FakeSink, SinkCall};
