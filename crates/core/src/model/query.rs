// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Query: which object(s) and attributes to read, and where results go

use super::{NameError, ObjectPattern};
use crate::sink::SinkRef;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A request for attributes of the objects matching a pattern.
///
/// Equality and hashing cover the selector, attributes, keys and alias
/// only. Two queries that differ just in their sinks are the same query,
/// which is what lets duplicate configuration be merged instead of
/// polled twice.
#[derive(Clone)]
pub struct Query {
    object: ObjectPattern,
    attributes: Vec<String>,
    keys: Vec<String>,
    alias: Option<String>,
    sinks: Vec<SinkRef>,
}

impl Query {
    pub fn new(object: ObjectPattern) -> Self {
        Self {
            object,
            attributes: Vec::new(),
            keys: Vec::new(),
            alias: None,
            sinks: Vec::new(),
        }
    }

    pub fn parse(object: &str) -> Result<Self, NameError> {
        Ok(Self::new(ObjectPattern::parse(object)?))
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attributes.push(attribute.into());
        self
    }

    pub fn with_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes.extend(attributes.into_iter().map(Into::into));
        self
    }

    pub fn with_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys.extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_sink(mut self, sink: SinkRef) -> Self {
        self.add_sink(sink);
        self
    }

    pub fn object(&self) -> &ObjectPattern {
        &self.object
    }

    /// Attributes to read; empty means every attribute the object exposes
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn sinks(&self) -> &[SinkRef] {
        &self.sinks
    }

    /// Fold another query's sinks into this one, skipping sinks already present
    pub(crate) fn absorb_sinks(&mut self, other: &Query) {
        for sink in &other.sinks {
            self.add_sink(Arc::clone(sink));
        }
    }

    fn add_sink(&mut self, sink: SinkRef) {
        if !self.sinks.iter().any(|s| same_sink(s, &sink)) {
            self.sinks.push(sink);
        }
    }
}

fn same_sink(a: &SinkRef, b: &SinkRef) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

impl PartialEq for Query {
    fn eq(&self, other: &Self) -> bool {
        self.object == other.object
            && self.attributes == other.attributes
            && self.keys == other.keys
            && self.alias == other.alias
    }
}

impl Eq for Query {}

impl Hash for Query {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.object.hash(state);
        self.attributes.hash(state);
        self.keys.hash(state);
        self.alias.hash(state);
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("object", &self.object.as_str())
            .field("attributes", &self.attributes)
            .field("keys", &self.keys)
            .field("alias", &self.alias)
            .field(
                "sinks",
                &self.sinks.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.object)?;
        if let Some(alias) = &self.alias {
            write!(f, " as {}", alias)?;
        }
        if !self.attributes.is_empty() {
            write!(f, " [{}]", self.attributes.join(","))?;
        }
        Ok(())
    }
}
