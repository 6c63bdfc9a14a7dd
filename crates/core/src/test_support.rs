// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local fakes shared by the unit tests in this crate

use crate::config::ConnectionPoolConfig;
use crate::connection::{Connection, ConnectionError, ConnectionFactory, KeyedConnectionPool};
use crate::model::{
    Attribute, AttributeValue, Endpoint, ObjectInfo, ObjectName, ObjectPattern, Query,
    QueryResult, Target, Value,
};
use crate::sink::{Sink, SinkError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub fn result(attribute: &str, value: impl Into<Value>) -> QueryResult {
    let mut values = BTreeMap::new();
    values.insert(attribute.to_string(), value.into());
    QueryResult {
        epoch_ms: 0,
        attribute: attribute.to_string(),
        class_name: "Fake".to_string(),
        domain: "test".to_string(),
        alias: None,
        type_name: "type=Fake".to_string(),
        values,
    }
}

pub fn numbered_results(n: i64) -> Vec<QueryResult> {
    (1..=n).map(|i| result(&format!("a{}", i), i)).collect()
}

/// One recorded `write` call
#[derive(Debug, Clone)]
pub struct Write {
    pub target: String,
    pub query: String,
    pub results: Vec<QueryResult>,
}

/// Records writes; optionally fails or panics on every write
pub struct RecordingSink {
    name: String,
    writes: Mutex<Vec<Write>>,
    fail: AtomicBool,
    panic: AtomicBool,
    attempts: AtomicUsize,
}

impl RecordingSink {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            writes: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
            panic: AtomicBool::new(false),
            attempts: AtomicUsize::new(0),
        })
    }

    pub fn failing(name: &str) -> Arc<Self> {
        let sink = Self::new(name);
        sink.set_failing(true);
        sink
    }

    pub fn panicking(name: &str) -> Arc<Self> {
        let sink = Self::new(name);
        sink.panic.store(true, Ordering::SeqCst);
        sink
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn writes(&self) -> Vec<Write> {
        self.writes.lock().unwrap().clone()
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.writes().iter().map(|w| w.results.len()).collect()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Sink for RecordingSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(
        &self,
        target: &Target,
        query: &Query,
        results: &[QueryResult],
    ) -> Result<(), SinkError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.panic.load(Ordering::SeqCst) {
            panic!("sink {} exploded", self.name);
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(SinkError::Write {
                sink: self.name.clone(),
                message: "refused".to_string(),
            });
        }
        self.writes.lock().unwrap().push(Write {
            target: target.id().to_string(),
            query: query.to_string(),
            results: results.to_vec(),
        });
        Ok(())
    }
}

/// In-memory object store standing in for a remote endpoint
#[derive(Default)]
pub struct FakeConnection {
    objects: Mutex<Vec<(ObjectName, String, Vec<Attribute>)>>,
    valid: AtomicBool,
    broken: AtomicBool,
    reads: AtomicUsize,
}

impl FakeConnection {
    pub fn new() -> Self {
        Self {
            valid: AtomicBool::new(true),
            ..Self::default()
        }
    }

    pub fn with_object(self, name: &str, class_name: &str, attributes: Vec<Attribute>) -> Self {
        self.objects.lock().unwrap().push((
            ObjectName::parse(name).unwrap(),
            class_name.to_string(),
            attributes,
        ));
        self
    }

    pub fn set_valid(&self, valid: bool) {
        self.valid.store(valid, Ordering::SeqCst);
    }

    pub fn set_broken(&self, broken: bool) {
        self.broken.store(broken, Ordering::SeqCst);
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), ConnectionError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(ConnectionError::Query("connection reset".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Connection for FakeConnection {
    async fn query_names(&self, pattern: &ObjectPattern) -> Result<Vec<ObjectName>, ConnectionError> {
        self.check()?;
        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _, _)| pattern.matches(name))
            .map(|(name, _, _)| name.clone())
            .collect())
    }

    async fn object_info(&self, name: &ObjectName) -> Result<ObjectInfo, ConnectionError> {
        self.check()?;
        let objects = self.objects.lock().unwrap();
        let (name, class_name, attributes) = objects
            .iter()
            .find(|(n, _, _)| n == name)
            .ok_or_else(|| ConnectionError::Query(format!("no such object {}", name)))?;
        Ok(ObjectInfo {
            name: name.clone(),
            class_name: class_name.clone(),
            attribute_names: attributes.iter().map(|a| a.name.clone()).collect(),
        })
    }

    async fn attributes(
        &self,
        name: &ObjectName,
        attributes: &[String],
    ) -> Result<Vec<Attribute>, ConnectionError> {
        self.check()?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        let objects = self.objects.lock().unwrap();
        let Some((_, _, available)) = objects.iter().find(|(n, _, _)| n == name) else {
            return Ok(Vec::new());
        };
        Ok(attributes
            .iter()
            .filter_map(|wanted| available.iter().find(|a| &a.name == wanted).cloned())
            .collect())
    }

    async fn is_valid(&self) -> bool {
        self.valid.load(Ordering::SeqCst)
    }
}

pub fn memory_object() -> FakeConnection {
    FakeConnection::new().with_object(
        "java.lang:type=Memory",
        "sun.management.MemoryImpl",
        vec![
            Attribute::new("ObjectPendingFinalizationCount", 0i64),
            Attribute::new("Verbose", AttributeValue::Bool(false)),
        ],
    )
}

/// Factory that hands out the same shared fake for every endpoint
#[derive(Clone)]
pub struct SharedFactory {
    pub conn: Arc<FakeConnection>,
    pub connects: Arc<AtomicUsize>,
}

#[async_trait]
impl ConnectionFactory for SharedFactory {
    async fn connect(&self, _endpoint: &Endpoint) -> Result<Box<dyn Connection>, ConnectionError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(Arc::clone(&self.conn)))
    }
}

pub fn connection_pool(conn: Arc<FakeConnection>) -> Arc<KeyedConnectionPool<SharedFactory>> {
    Arc::new(KeyedConnectionPool::new(
        SharedFactory {
            conn,
            connects: Arc::new(AtomicUsize::new(0)),
        },
        ConnectionPoolConfig::default(),
    ))
}
