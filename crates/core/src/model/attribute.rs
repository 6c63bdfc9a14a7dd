// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Raw attribute values as read from an endpoint, before flattening

use super::ObjectName;
use std::collections::BTreeMap;

/// A single attribute read from an object
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: AttributeValue,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Attribute value shapes an endpoint may return
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    /// Array of scalars (or anything else that is not a composite)
    Array(Vec<AttributeValue>),
    /// Struct-like value
    Composite(CompositeValue),
    /// Array of struct-like values
    CompositeArray(Vec<CompositeValue>),
    /// Table of struct-like rows keyed by index values
    Tabular(TabularValue),
    /// Plain map with arbitrary keys
    Map(Vec<(String, AttributeValue)>),
    /// References to other objects
    ObjectNames(Vec<ObjectName>),
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        AttributeValue::Bool(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Integer(v)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Float(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::Text(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::Text(v)
    }
}

impl From<CompositeValue> for AttributeValue {
    fn from(v: CompositeValue) -> Self {
        AttributeValue::Composite(v)
    }
}

impl From<TabularValue> for AttributeValue {
    fn from(v: TabularValue) -> Self {
        AttributeValue::Tabular(v)
    }
}

/// Struct-like value with named members
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompositeValue {
    /// Members keyed by name (iteration order is key order)
    pub members: BTreeMap<String, AttributeValue>,
}

impl CompositeValue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.members.insert(key.into(), value.into());
        self
    }
}

/// One table row: its index key values plus the row content
#[derive(Debug, Clone, PartialEq)]
pub struct TabularRow {
    pub index: Vec<String>,
    pub row: CompositeValue,
}

/// Table of composite rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabularValue {
    pub rows: Vec<TabularRow>,
}

impl TabularValue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_row<I, S>(mut self, index: I, row: CompositeValue) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(TabularRow {
            index: index.into_iter().map(Into::into).collect(),
            row,
        });
        self
    }
}

/// Describes an object: its class and the attributes it exposes
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectInfo {
    pub name: ObjectName,
    pub class_name: String,
    pub attribute_names: Vec<String>,
}
