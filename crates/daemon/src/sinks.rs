// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Building sinks from `[sinks.<name>]` sections

use crate::config::{SinkConfig, SinkKind};
use jx_adapters::{JsonLinesSink, LogSink, TracedSink};
use jx_core::{
    BooleanAsNumber, CircuitBreakerSink, Clock, ComposedTransformer, MaxBatchSizeSink,
    NearZeroAsZero, SinkRef, SystemClock, TransformingSink,
};
use std::num::NonZeroUsize;
use std::sync::Arc;

pub fn build_sink(name: &str, config: &SinkConfig) -> SinkRef {
    let base: SinkRef = match config.kind {
        SinkKind::Stdout => Arc::new(TracedSink::new(JsonLinesSink::stdout(name))),
        SinkKind::Log => Arc::new(TracedSink::new(LogSink::new(name))),
    };
    wrap_sink(base, config, SystemClock)
}

/// Layer the configured wrappers around `base`, innermost first:
/// value transformers, batch splitting, circuit breaker.
pub fn wrap_sink<C: Clock>(base: SinkRef, config: &SinkConfig, clock: C) -> SinkRef {
    let mut sink = base;

    let mut transformer = ComposedTransformer::new();
    if config.boolean_as_number {
        transformer = transformer.then(Arc::new(BooleanAsNumber::default()));
    }
    if config.near_zero {
        transformer = transformer.then(Arc::new(NearZeroAsZero::default()));
    }
    if !transformer.is_empty() {
        sink = Arc::new(TransformingSink::new(Arc::new(transformer), sink));
    }

    if let Some(max) = config.max_batch_size.and_then(NonZeroUsize::new) {
        sink = Arc::new(MaxBatchSizeSink::new(max, sink));
    }

    if let Some(breaker) = &config.circuit_breaker {
        sink = Arc::new(
            CircuitBreakerSink::new(sink, clock)
                .with_failure_threshold(breaker.failure_threshold)
                .with_open_for(breaker.open_for),
        );
    }
    sink
}

#[cfg(test)]
#[path = "sinks_tests.rs"]
mod tests;
