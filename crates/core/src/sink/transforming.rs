// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{Sink, SinkError};
use crate::model::{Query, QueryResult, Target};
use crate::transform::{BooleanAsNumber, IdentityTransformer, ValueTransformer};
use async_trait::async_trait;
use std::sync::Arc;

/// Passes every result value through a transformer before the inner sink
/// sees it
pub struct TransformingSink<S> {
    transformer: Arc<dyn ValueTransformer>,
    inner: S,
}

impl<S: Sink> TransformingSink<S> {
    pub fn new(transformer: Arc<dyn ValueTransformer>, inner: S) -> Self {
        Self { transformer, inner }
    }

    /// Booleans become 1 (true) / 0 (false)
    pub fn boolean_to_number(inner: S) -> Self {
        Self::new(Arc::new(BooleanAsNumber::default()), inner)
    }

    pub fn identity(inner: S) -> Self {
        Self::new(Arc::new(IdentityTransformer), inner)
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: Sink> Sink for TransformingSink<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn start(&self) -> Result<(), SinkError> {
        self.inner.start().await
    }

    async fn stop(&self) -> Result<(), SinkError> {
        self.inner.stop().await
    }

    async fn write(
        &self,
        target: &Target,
        query: &Query,
        results: &[QueryResult],
    ) -> Result<(), SinkError> {
        let transformed: Vec<QueryResult> = results
            .iter()
            .map(|r| r.map_values(|v| self.transformer.apply(v)))
            .collect();
        self.inner.write(target, query, &transformed).await
    }
}

#[cfg(test)]
#[path = "transforming_tests.rs"]
mod tests;
