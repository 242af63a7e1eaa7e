use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Anything the aggregator can sort and filter by name.
pub trait Named {
    fn name(&self) -> &str;
}

/// A discovered service definition.
///
/// Only `name` carries meaning for discovery; the remaining fields belong to
/// whatever produced the record and are passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Directory the service was declared in, relative to the scan root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

/// A discovered group of services (or of other groups).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub children: Vec<String>,
}

impl ServiceConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            path: None,
            properties: BTreeMap::new(),
        }
    }
}

impl GroupConfig {
    pub fn new(name: impl Into<String>, children: Vec<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            children,
        }
    }
}

impl Named for ServiceConfig {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for GroupConfig {
    fn name(&self) -> &str {
        &self.name
    }
}
