// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Data model: targets, queries, raw attributes and flattened results

mod attribute;
mod name;
mod query;
mod result;
mod target;

pub use attribute::{
    Attribute, AttributeValue, CompositeValue, ObjectInfo, TabularRow, TabularValue,
};
pub use name::{NameError, ObjectName, ObjectPattern};
pub use query::Query;
pub use result::{QueryResult, Value};
pub use target::{Credentials, Endpoint, Target, TargetId};

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
