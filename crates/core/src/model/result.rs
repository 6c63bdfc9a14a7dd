// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Flattened attribute readings handed to sinks

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A scalar leaf value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

/// One flattened attribute reading
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    /// Milliseconds since the Unix epoch when the reading was taken
    pub epoch_ms: i64,
    pub attribute: String,
    pub class_name: String,
    pub domain: String,
    pub alias: Option<String>,
    /// Canonical key property list of the source object
    pub type_name: String,
    pub values: BTreeMap<String, Value>,
}

impl QueryResult {
    /// Same reading with each value passed through `f`
    pub fn map_values(&self, mut f: impl FnMut(Value) -> Value) -> QueryResult {
        QueryResult {
            epoch_ms: self.epoch_ms,
            attribute: self.attribute.clone(),
            class_name: self.class_name.clone(),
            domain: self.domain.clone(),
            alias: self.alias.clone(),
            type_name: self.type_name.clone(),
            values: self
                .values
                .iter()
                .map(|(k, v)| (k.clone(), f(v.clone())))
                .collect(),
        }
    }
}
