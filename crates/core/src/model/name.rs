// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Object names and object-name patterns
//!
//! Names follow the `domain:key=value,key=value` shape used by management
//! endpoints. Patterns allow `*` and `?` in the domain and in property
//! values, plus a trailing `*` entry that admits extra properties.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors from parsing names or patterns
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("object name {0:?} has no domain separator ':'")]
    MissingDomain(String),
    #[error("object name {0:?} has no key properties")]
    NoProperties(String),
    #[error("object name {name:?} has malformed property {property:?}")]
    BadProperty { name: String, property: String },
    #[error("object name {name:?} repeats key {key:?}")]
    DuplicateKey { name: String, key: String },
    #[error("object name {0:?} may not contain wildcards")]
    Wildcard(String),
}

/// A concrete object name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectName {
    domain: String,
    /// Properties in declaration order
    properties: Vec<(String, String)>,
}

impl ObjectName {
    pub fn parse(raw: &str) -> Result<Self, NameError> {
        let (domain, properties) = split_name(raw)?;
        if has_wildcard(&domain) || properties.iter().any(|(_, v)| has_wildcard(v)) {
            return Err(NameError::Wildcard(raw.to_string()));
        }
        if properties.iter().any(|(k, _)| k == "*") {
            return Err(NameError::Wildcard(raw.to_string()));
        }
        if properties.is_empty() {
            return Err(NameError::NoProperties(raw.to_string()));
        }
        Ok(Self { domain, properties })
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Properties as declared, e.g. `type=Memory,name=heap`
    pub fn key_property_list(&self) -> String {
        join_properties(self.properties.iter())
    }

    /// Properties sorted by key, e.g. `name=heap,type=Memory`
    pub fn canonical_key_property_list(&self) -> String {
        let mut sorted: Vec<_> = self.properties.iter().collect();
        sorted.sort();
        join_properties(sorted.into_iter())
    }

    pub fn canonical_name(&self) -> String {
        format!("{}:{}", self.domain, self.canonical_key_property_list())
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.domain, self.key_property_list())
    }
}

impl FromStr for ObjectName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ObjectName {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ObjectName> for String {
    fn from(name: ObjectName) -> Self {
        name.to_string()
    }
}

/// A selector matching zero or more object names
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectPattern {
    raw: String,
    domain: String,
    properties: Vec<(String, String)>,
    /// Trailing `*`: names may carry properties beyond the listed ones
    open: bool,
}

impl ObjectPattern {
    pub fn parse(raw: &str) -> Result<Self, NameError> {
        let (domain, mut properties) = split_name(raw)?;
        let before = properties.len();
        properties.retain(|(k, _)| k != "*");
        let open = properties.len() != before;
        if properties.is_empty() && !open {
            return Err(NameError::NoProperties(raw.to_string()));
        }
        Ok(Self {
            raw: raw.to_string(),
            domain,
            properties,
            open,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// True when the pattern names exactly one object
    pub fn is_exact(&self) -> bool {
        !self.open
            && !has_wildcard(&self.domain)
            && !self.properties.iter().any(|(_, v)| has_wildcard(v))
    }

    pub fn matches(&self, name: &ObjectName) -> bool {
        if !glob_match(&self.domain, name.domain()) {
            return false;
        }
        let all_listed = self.properties.iter().all(|(key, pattern)| {
            name.property(key)
                .is_some_and(|value| glob_match(pattern, value))
        });
        if !all_listed {
            return false;
        }
        self.open || name.properties.len() == self.properties.len()
    }
}

impl fmt::Display for ObjectPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for ObjectPattern {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ObjectPattern {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ObjectPattern> for String {
    fn from(pattern: ObjectPattern) -> Self {
        pattern.raw
    }
}

fn split_name(raw: &str) -> Result<(String, Vec<(String, String)>), NameError> {
    let (domain, rest) = raw
        .split_once(':')
        .ok_or_else(|| NameError::MissingDomain(raw.to_string()))?;
    let mut properties: Vec<(String, String)> = Vec::new();
    for entry in rest.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        if entry == "*" {
            properties.push(("*".to_string(), String::new()));
            continue;
        }
        let (key, value) = entry
            .split_once('=')
            .filter(|(k, v)| !k.is_empty() && !v.is_empty())
            .ok_or_else(|| NameError::BadProperty {
                name: raw.to_string(),
                property: entry.to_string(),
            })?;
        if properties.iter().any(|(k, _)| k == key) {
            return Err(NameError::DuplicateKey {
                name: raw.to_string(),
                key: key.to_string(),
            });
        }
        properties.push((key.to_string(), value.to_string()));
    }
    Ok((domain.to_string(), properties))
}

fn join_properties<'a>(properties: impl Iterator<Item = &'a (String, String)>) -> String {
    properties
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(",")
}

fn has_wildcard(s: &str) -> bool {
    s.contains(['*', '?'])
}

/// Glob match supporting `*` (any run) and `?` (any single char)
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    let (mut p, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some(&c) if c == '?' || c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match backtrack {
                Some((star, matched)) => {
                    p = star + 1;
                    t = matched + 1;
                    backtrack = Some((star, matched + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|&c| c == '*')
}

#[cfg(test)]
#[path = "name_tests.rs"]
mod tests;
