// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Value transformers applied to results before they reach a sink

use crate::model::Value;
use std::sync::Arc;

/// Smallest magnitude treated as a real number by [`NearZeroAsZero`]
pub const NEAR_ZERO_THRESHOLD: f64 = 1e-308;

/// Rewrites a single result value
pub trait ValueTransformer: Send + Sync {
    fn apply(&self, value: Value) -> Value;
}

/// Returns every value unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTransformer;

impl ValueTransformer for IdentityTransformer {
    fn apply(&self, value: Value) -> Value {
        value
    }
}

/// Replaces booleans with fixed numbers; everything else passes through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BooleanAsNumber {
    pub on_true: i64,
    pub on_false: i64,
}

impl BooleanAsNumber {
    pub fn new(on_true: i64, on_false: i64) -> Self {
        Self { on_true, on_false }
    }
}

impl Default for BooleanAsNumber {
    fn default() -> Self {
        Self::new(1, 0)
    }
}

impl ValueTransformer for BooleanAsNumber {
    fn apply(&self, value: Value) -> Value {
        match value {
            Value::Bool(true) => Value::Integer(self.on_true),
            Value::Bool(false) => Value::Integer(self.on_false),
            other => other,
        }
    }
}

/// Collapses floats too small for downstream consumers to integer zero
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearZeroAsZero {
    pub threshold: f64,
}

impl Default for NearZeroAsZero {
    fn default() -> Self {
        Self {
            threshold: NEAR_ZERO_THRESHOLD,
        }
    }
}

impl ValueTransformer for NearZeroAsZero {
    fn apply(&self, value: Value) -> Value {
        match value {
            Value::Float(f) if f.abs() < self.threshold => Value::Integer(0),
            other => other,
        }
    }
}

/// Applies transformers in order
#[derive(Clone, Default)]
pub struct ComposedTransformer(Vec<Arc<dyn ValueTransformer>>);

impl ComposedTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, transformer: Arc<dyn ValueTransformer>) -> Self {
        self.0.push(transformer);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl ValueTransformer for ComposedTransformer {
    fn apply(&self, value: Value) -> Value {
        self.0.iter().fold(value, |v, t| t.apply(v))
    }
}

#[cfg(test)]
#[path = "transform_tests.rs"]
mod tests;
