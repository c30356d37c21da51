//! Resource and material models.
//!
//! Resources are the plant entities that host process steps: reactors,
//! filters, tanks, fillers. A resource hosts at most one active interval at
//! a time, so every resource is a disjunctive (no-overlap) resource.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A plant resource that processes can be assigned to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Unique resource code. No-overlap groups are keyed by it.
    pub code: String,
    /// Human-readable name.
    pub name: String,
    /// Resource classification.
    pub resource_type: ResourceType,
    /// Domain-specific metadata.
    pub attributes: HashMap<String, String>,
}

/// Resource type classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    /// Transforms material (e.g., reactor, filter, filler).
    #[default]
    Processor,
    /// Holds material (e.g., tank, silo).
    Storage,
    /// Both processes and holds material.
    Mixed,
}

/// A material produced or consumed by processes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Material {
    /// Unique material code. The recipe catalog is keyed by it.
    pub code: String,
    /// Human-readable name.
    pub name: String,
}

impl Resource {
    /// Creates a new resource.
    pub fn new(code: impl Into<String>, resource_type: ResourceType) -> Self {
        Self {
            code: code.into(),
            name: String::new(),
            resource_type,
            attributes: HashMap::new(),
        }
    }

    /// Creates a processor resource.
    pub fn processor(code: impl Into<String>) -> Self {
        Self::new(code, ResourceType::Processor)
    }

    /// Creates a storage resource.
    pub fn storage(code: impl Into<String>) -> Self {
        Self::new(code, ResourceType::Storage)
    }

    /// Creates a mixed resource.
    pub fn mixed(code: impl Into<String>) -> Self {
        Self::new(code, ResourceType::Mixed)
    }

    /// Sets the resource name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds a domain-specific attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

impl Material {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: String::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}
