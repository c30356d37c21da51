//! Recipe and process models.
//!
//! A recipe describes how one or more materials are produced as a DAG of
//! processes. Links between processes are declared on the processes
//! themselves (successors and/or predecessors, by process code).
//!
//! # Optional groups
//! Processes sharing an `optional_group` tag are mutually exclusive
//! alternatives: when the recipe is selected exactly one member of each
//! group runs.

use serde::{Deserialize, Serialize};

use super::{Material, Resource};

/// One step of a recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Process {
    /// Unique process code within its recipe.
    pub code: String,
    /// Human-readable name.
    pub name: String,
    /// Code of the duration function (see `DurationRegistry`).
    pub duration_fn: String,
    /// Resources held for the whole duration of the step.
    pub resources: Vec<Resource>,
    /// Materials consumed by the step.
    pub materials: Vec<Material>,
    /// Optional-group tag. `None` = mandatory.
    pub optional_group: Option<String>,
    /// Codes of processes that must start after this one ends.
    pub successors: Vec<String>,
    /// Codes of processes that must end before this one starts.
    pub predecessors: Vec<String>,
}

impl Process {
    /// Creates a mandatory process bound to a duration function code.
    pub fn new(code: impl Into<String>, duration_fn: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: String::new(),
            duration_fn: duration_fn.into(),
            resources: Vec::new(),
            materials: Vec::new(),
            optional_group: None,
            successors: Vec::new(),
            predecessors: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds a required resource.
    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resources.push(resource);
        self
    }

    /// Adds a consumed material.
    pub fn with_material(mut self, material: Material) -> Self {
        self.materials.push(material);
        self
    }

    /// Marks the process as a member of an optional group.
    pub fn with_optional_group(mut self, group: impl Into<String>) -> Self {
        self.optional_group = Some(group.into());
        self
    }

    /// Declares a successor link.
    pub fn with_successor(mut self, code: impl Into<String>) -> Self {
        self.successors.push(code.into());
        self
    }

    /// Declares a predecessor link.
    pub fn with_predecessor(mut self, code: impl Into<String>) -> Self {
        self.predecessors.push(code.into());
        self
    }

    /// Whether the process belongs to an optional group.
    pub fn is_optional(&self) -> bool {
        self.optional_group.is_some()
    }

    /// Whether this process and `other` require at least one common resource.
    pub fn shares_resource(&self, other: &Process) -> bool {
        self.common_resources(other).next().is_some()
    }

    /// Resources required by both this process and `other`.
    pub fn common_resources<'a>(&'a self, other: &'a Process) -> impl Iterator<Item = &'a Resource> {
        self.resources
            .iter()
            .filter(move |r| other.resources.iter().any(|o| o.code == r.code))
    }
}

/// A production recipe: processes connected as a DAG plus produced materials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    /// Unique recipe code.
    pub code: String,
    /// Human-readable name.
    pub name: String,
    /// Processes in declaration order.
    pub processes: Vec<Process>,
    /// Materials this recipe produces.
    pub materials: Vec<Material>,
}

impl Recipe {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: String::new(),
            processes: Vec::new(),
            materials: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_process(mut self, process: Process) -> Self {
        self.processes.push(process);
        self
    }

    /// Adds a produced material.
    pub fn with_material(mut self, material: Material) -> Self {
        self.materials.push(material);
        self
    }

    /// Finds a process by code.
    pub fn process(&self, code: &str) -> Option<&Process> {
        self.processes.iter().find(|p| p.code == code)
    }

    /// Whether this recipe produces the given material.
    pub fn produces(&self, material_code: &str) -> bool {
        self.materials.iter().any(|m| m.code == material_code)
    }
}
