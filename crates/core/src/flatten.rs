// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Flattening of raw attribute values into scalar query results
//!
//! | value                | results                                          |
//! |----------------------|--------------------------------------------------|
//! | null                 | none                                             |
//! | scalar               | one, `{attr: value}`                             |
//! | composite            | one with its scalar members, nested values below |
//! | composite array      | one per element                                  |
//! | tabular              | one per row, named `attr.<index keys>`           |
//! | array                | one, `{attr.0: .., attr.1: ..}`                  |
//! | map                  | one, keys as given                               |
//! | object names         | one, `{canonical name: key property list}`       |
//!
//! Values nested inside a composite are flattened under `attr.member`.

use crate::model::{
    Attribute, AttributeValue, CompositeValue, ObjectInfo, Query, QueryResult, TabularValue, Value,
};
use std::collections::BTreeMap;

/// Turns the attributes read from one object into results
pub struct ResultFlattener<'a> {
    query: &'a Query,
    info: &'a ObjectInfo,
    epoch_ms: i64,
}

impl<'a> ResultFlattener<'a> {
    pub fn new(query: &'a Query, info: &'a ObjectInfo, epoch_ms: i64) -> Self {
        Self {
            query,
            info,
            epoch_ms,
        }
    }

    /// Results in attribute order
    pub fn flatten(&self, attributes: Vec<Attribute>) -> Vec<QueryResult> {
        let mut out = Vec::new();
        for attribute in attributes {
            self.add(&mut out, &attribute.name, attribute.value);
        }
        out
    }

    fn add(&self, out: &mut Vec<QueryResult>, name: &str, value: AttributeValue) {
        match value {
            AttributeValue::Null => {}
            AttributeValue::Composite(composite) => self.add_composite(out, name, composite),
            AttributeValue::CompositeArray(items) => {
                for composite in items {
                    self.add_composite(out, name, composite);
                }
            }
            AttributeValue::Tabular(table) => self.add_tabular(out, name, table),
            AttributeValue::Array(items) => {
                let values = items
                    .into_iter()
                    .enumerate()
                    .filter_map(|(i, v)| scalar(v).map(|v| (format!("{}.{}", name, i), v)))
                    .collect();
                self.push(out, name, values);
            }
            AttributeValue::Map(entries) => {
                let values = entries
                    .into_iter()
                    .filter_map(|(k, v)| scalar(v).map(|v| (k, v)))
                    .collect();
                self.push(out, name, values);
            }
            AttributeValue::ObjectNames(names) => {
                let values = names
                    .iter()
                    .map(|n| (n.canonical_name(), Value::Text(n.key_property_list())))
                    .collect();
                self.push(out, name, values);
            }
            scalar_value => {
                if let Some(v) = scalar(scalar_value) {
                    let mut values = BTreeMap::new();
                    values.insert(name.to_string(), v);
                    self.push(out, name, values);
                }
            }
        }
    }

    fn add_composite(&self, out: &mut Vec<QueryResult>, name: &str, composite: CompositeValue) {
        let mut values = BTreeMap::new();
        let mut nested = Vec::new();
        for (key, value) in composite.members {
            if is_scalar(&value) {
                if let Some(v) = scalar(value) {
                    values.insert(key, v);
                }
            } else {
                nested.push((format!("{}.{}", name, key), value));
            }
        }
        // the composite's own scalars come before anything nested in it
        if !values.is_empty() {
            self.push(out, name, values);
        }
        for (nested_name, value) in nested {
            self.add(out, &nested_name, value);
        }
    }

    fn add_tabular(&self, out: &mut Vec<QueryResult>, name: &str, table: TabularValue) {
        for row in table.rows {
            let row_name = std::iter::once(name.to_string())
                .chain(row.index)
                .collect::<Vec<_>>()
                .join(".");
            self.add_composite(out, &row_name, row.row);
        }
    }

    fn push(&self, out: &mut Vec<QueryResult>, name: &str, values: BTreeMap<String, Value>) {
        out.push(QueryResult {
            epoch_ms: self.epoch_ms,
            attribute: name.to_string(),
            class_name: self.info.class_name.clone(),
            domain: self.info.name.domain().to_string(),
            alias: self.query.alias().map(str::to_string),
            type_name: self.info.name.canonical_key_property_list(),
            values,
        });
    }
}

fn is_scalar(value: &AttributeValue) -> bool {
    matches!(
        value,
        AttributeValue::Null
            | AttributeValue::Bool(_)
            | AttributeValue::Integer(_)
            | AttributeValue::Float(_)
            | AttributeValue::Text(_)
    )
}

fn scalar(value: AttributeValue) -> Option<Value> {
    match value {
        AttributeValue::Bool(b) => Some(Value::Bool(b)),
        AttributeValue::Integer(i) => Some(Value::Integer(i)),
        AttributeValue::Float(f) => Some(Value::Float(f)),
        AttributeValue::Text(s) => Some(Value::Text(s)),
        _ => None,
    }
}

#[cfg(test)]
#[path = "flatten_tests.rs"]
mod tests;
