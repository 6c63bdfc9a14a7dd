// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{Sink, SinkError};
use crate::model::{Query, QueryResult, Target};
use async_trait::async_trait;
use std::num::NonZeroUsize;

/// Splits every batch into chunks of at most `max` results and writes them
/// in order, one `write` per chunk. The first failing chunk stops the rest.
pub struct MaxBatchSizeSink<S> {
    max: NonZeroUsize,
    inner: S,
}

impl<S: Sink> MaxBatchSizeSink<S> {
    pub fn new(max: NonZeroUsize, inner: S) -> Self {
        Self { max, inner }
    }

    pub fn max_batch_size(&self) -> usize {
        self.max.get()
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: Sink> Sink for MaxBatchSizeSink<S> {
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
        for chunk in results.chunks(self.max.get()) {
            self.inner.write(target, query, chunk).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "batch_tests.rs"]
mod tests;
