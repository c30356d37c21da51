//! Resource stoppage model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Resource;

/// A resource downtime interval (maintenance, cleaning, breakdown).
///
/// Stops are materialized as plans before solving and act as fixed
/// commitments on every linked resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    /// Unique stop code.
    pub code: String,
    /// Why the resources are unavailable.
    pub reason: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    /// Resources blocked by this stop.
    pub resources: Vec<Resource>,
}

impl Stop {
    pub fn new(
        code: impl Into<String>,
        reason: impl Into<String>,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
    ) -> Self {
        Self {
            code: code.into(),
            reason: reason.into(),
            start_at,
            end_at,
            resources: Vec::new(),
        }
    }

    /// Adds a blocked resource.
    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resources.push(resource);
        self
    }

    /// Whether the stop blocks the given resource.
    pub fn blocks(&self, resource_code: &str) -> bool {
        self.resources.iter().any(|r| r.code == resource_code)
    }
}
