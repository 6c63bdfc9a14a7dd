// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process management endpoint
//!
//! Objects registered on an [`InProcessServer`] are visible to `local`
//! targets, which read them through the same [`Connection`] contract
//! used for remote endpoints. The daemon registers its own worker pool
//! statistics here so it can monitor itself.

#[cfg(any(test, feature = "test-support"))]
mod fake;
mod noop;

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeConnectionFactory;
pub use noop::NoOpConnectionFactory;

use async_trait::async_trait;
use jx_core::{
    Attribute, AttributeValue, Connection, ConnectionError, ObjectInfo, ObjectName, ObjectPattern,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

/// Something that can describe itself as a managed object
pub trait ObjectSource: Send + Sync {
    fn class_name(&self) -> &str;

    /// Current attribute values
    fn attributes(&self) -> Vec<Attribute>;
}

/// An object whose attributes are set explicitly
pub struct LocalObject {
    class_name: String,
    attributes: Mutex<Vec<Attribute>>,
}

impl LocalObject {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            attributes: Mutex::new(Vec::new()),
        }
    }

    pub fn with_attribute(self, name: &str, value: impl Into<AttributeValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Insert or replace an attribute
    pub fn set(&self, name: &str, value: impl Into<AttributeValue>) {
        let mut attributes = self.attributes.lock().unwrap_or_else(|e| e.into_inner());
        let value = value.into();
        match attributes.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.value = value,
            None => attributes.push(Attribute::new(name, value)),
        }
    }
}

impl ObjectSource for LocalObject {
    fn class_name(&self) -> &str {
        &self.class_name
    }

    fn attributes(&self) -> Vec<Attribute> {
        self.attributes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

/// Registry of objects served to `local` targets
#[derive(Default)]
pub struct InProcessServer {
    objects: RwLock<HashMap<ObjectName, Arc<dyn ObjectSource>>>,
}

impl InProcessServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `source` under `name`, returning what it replaced
    pub fn register(
        &self,
        name: ObjectName,
        source: Arc<dyn ObjectSource>,
    ) -> Option<Arc<dyn ObjectSource>> {
        tracing::debug!(object = %name, "registering local object");
        self.objects
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name, source)
    }

    pub fn unregister(&self, name: &ObjectName) -> bool {
        self.objects
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(name)
            .is_some()
    }

    /// Registered names in display order
    pub fn names(&self) -> Vec<ObjectName> {
        let mut names: Vec<ObjectName> = self
            .objects
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        names.sort_by_key(|n| n.to_string());
        names
    }

    pub fn len(&self) -> usize {
        self.objects.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, name: &ObjectName) -> Result<Arc<dyn ObjectSource>, ConnectionError> {
        self.objects
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
            .ok_or_else(|| ConnectionError::Query(format!("no such object: {}", name)))
    }
}

#[async_trait]
impl Connection for InProcessServer {
    async fn query_names(
        &self,
        pattern: &ObjectPattern,
    ) -> Result<Vec<ObjectName>, ConnectionError> {
        Ok(self
            .names()
            .into_iter()
            .filter(|name| pattern.matches(name))
            .collect())
    }

    async fn object_info(&self, name: &ObjectName) -> Result<ObjectInfo, ConnectionError> {
        let source = self.lookup(name)?;
        Ok(ObjectInfo {
            name: name.clone(),
            class_name: source.class_name().to_string(),
            attribute_names: source.attributes().into_iter().map(|a| a.name).collect(),
        })
    }

    async fn attributes(
        &self,
        name: &ObjectName,
        attributes: &[String],
    ) -> Result<Vec<Attribute>, ConnectionError> {
        let mut current = self.lookup(name)?.attributes();
        Ok(attributes
            .iter()
            .filter_map(|wanted| {
                let idx = current.iter().position(|a| &a.name == wanted)?;
                Some(current.swap_remove(idx))
            })
            .collect())
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
