// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Merging target lists from several configuration sources

use crate::model::Target;

/// Collects targets, folding together targets with the same identity.
///
/// Queries of merged targets are deduplicated by query equality and their
/// sink lists are unioned. The first occurrence of a target decides its
/// position and run period.
#[derive(Debug, Default)]
pub struct TargetListBuilder {
    targets: Vec<Target>,
}

impl TargetListBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, target: Target) -> &mut Self {
        match self.targets.iter_mut().find(|t| t.same_identity(&target)) {
            Some(existing) => {
                for query in target.queries() {
                    existing.add_query(query.clone());
                }
            }
            None => self.targets.push(target),
        }
        self
    }

    pub fn add_all(&mut self, targets: impl IntoIterator<Item = Target>) -> &mut Self {
        for target in targets {
            self.add(target);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn build(self) -> Vec<Target> {
        self.targets
    }
}

#[cfg(test)]
#[path = "merge_tests.rs"]
mod tests;
