// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::{numbered_results, RecordingSink};
use crate::model::Value;
use proptest::prelude::*;
use std::sync::Arc;

fn batched(max: usize, inner: Arc<RecordingSink>) -> MaxBatchSizeSink<Arc<RecordingSink>> {
    MaxBatchSizeSink::new(NonZeroUsize::new(max).unwrap(), inner)
}

fn query() -> Query {
    Query::parse("java.lang:type=Memory").unwrap()
}

#[tokio::test]
async fn splits_batches_in_order() {
    let inner = RecordingSink::new("rec");
    let sink = batched(2, Arc::clone(&inner));

    sink.write(&Target::local(), &query(), &numbered_results(5))
        .await
        .unwrap();

    assert_eq!(inner.batch_sizes(), vec![2, 2, 1]);
    let order: Vec<Value> = inner
        .writes()
        .iter()
        .flat_map(|w| w.results.iter().map(|r| r.values[&r.attribute].clone()))
        .collect();
    assert_eq!(order, (1..=5).map(Value::Integer).collect::<Vec<_>>());
}

#[tokio::test]
async fn empty_batch_writes_nothing() {
    let inner = RecordingSink::new("rec");
    let sink = batched(3, Arc::clone(&inner));
    sink.write(&Target::local(), &query(), &[]).await.unwrap();
    assert_eq!(inner.attempts(), 0);
}

#[tokio::test]
async fn first_failure_stops_remaining_chunks() {
    let inner = RecordingSink::failing("rec");
    let sink = batched(2, Arc::clone(&inner));
    let err = sink
        .write(&Target::local(), &query(), &numbered_results(5))
        .await
        .unwrap_err();
    assert!(matches!(err, SinkError::Write { .. }));
    assert_eq!(inner.attempts(), 1);
}

proptest! {
    #[test]
    fn chunks_cover_all_results_without_exceeding_max(n in 0i64..40, max in 1usize..8) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let inner = RecordingSink::new("rec");
        let sink = batched(max, Arc::clone(&inner));
        rt.block_on(sink.write(&Target::local(), &query(), &numbered_results(n))).unwrap();

        let sizes = inner.batch_sizes();
        prop_assert_eq!(sizes.iter().sum::<usize>(), n as usize);
        prop_assert!(sizes.iter().all(|s| *s >= 1 && *s <= max));
        // every chunk but the last is full
        if let Some((_, full)) = sizes.split_last() {
            prop_assert!(full.iter().all(|s| *s == max));
        }
    }
}
