//! Planner and repair configuration.
//!
//! Both configurations deserialize from JSON with every field optional
//! (missing fields take their defaults) and can be built in code with the
//! `with_*` methods.
//!
//! ```
//! use recipe_schedule::config::PlannerConfig;
//! use recipe_schedule::models::TimeScale;
//!
//! let config = PlannerConfig::from_json(r#"{"scale": "hours", "targets": ["makespan"]}"#).unwrap();
//! assert_eq!(config.scale, TimeScale::Hours);
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::cp::SolverParams;
use crate::error::PlanningError;
use crate::flowshop::{OptimizationMode, Target};
use crate::models::{Pivot, TimeScale};

/// Configuration of a build-and-solve run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Instant mapped to 0 in the solver's time domain. `None` = now.
    pub pivot: Option<DateTime<Utc>>,
    /// Unit of the solver's time domain.
    pub scale: TimeScale,
    /// Objective targets, summed. Empty = feasibility only.
    pub targets: Vec<Target>,
    pub mode: OptimizationMode,
    /// Budget passed to the solver.
    pub solver: SolverParams,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            pivot: None,
            scale: TimeScale::Minutes,
            targets: Vec::new(),
            mode: OptimizationMode::Minimize,
            solver: SolverParams::default(),
        }
    }
}

impl PlannerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, PlanningError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_pivot(mut self, pivot: DateTime<Utc>) -> Self {
        self.pivot = Some(pivot);
        self
    }

    pub fn with_scale(mut self, scale: TimeScale) -> Self {
        self.scale = scale;
        self
    }

    /// Adds an objective target (duplicates are kept once).
    pub fn with_target(mut self, target: Target) -> Self {
        if !self.targets.contains(&target) {
            self.targets.push(target);
        }
        self
    }

    pub fn with_mode(mut self, mode: OptimizationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_solver(mut self, solver: SolverParams) -> Self {
        self.solver = solver;
        self
    }

    /// Pivot of a run started now.
    pub fn resolve_pivot(&self) -> Pivot {
        Pivot::new(self.pivot.unwrap_or_else(Utc::now), self.scale)
    }
}

/// Configuration of the overlap-repair heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepairConfig {
    /// Iteration cap.
    pub max_iterations: usize,
    /// Gap inserted after the plan a delayed plan is pushed behind.
    pub gap_seconds: i64,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            gap_seconds: 1,
        }
    }
}

impl RepairConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, PlanningError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_gap_seconds(mut self, gap_seconds: i64) -> Self {
        self.gap_seconds = gap_seconds;
        self
    }

    pub fn gap(&self) -> Duration {
        Duration::seconds(self.gap_seconds)
    }
}
