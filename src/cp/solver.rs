//! Solver contract.
//!
//! Any constraint-programming backend can be plugged in by implementing
//! [`Solver`]. The call is synchronous; it returns one final status and,
//! when a solution was found, a value for every variable of the model.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::model::{BoolVar, CpModel, IntVar, Literal};

/// Final status of a solve call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolveStatus {
    /// Proven optimal (or proven feasible when there is no objective).
    Optimal,
    /// A solution was found but not proven optimal within the budget.
    Feasible,
    /// Proven to have no solution.
    Infeasible,
    /// The model is malformed.
    ModelInvalid,
    /// The budget ran out before anything was proven.
    Unknown,
}

impl SolveStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SolveStatus::Optimal => "OPTIMAL",
            SolveStatus::Feasible => "FEASIBLE",
            SolveStatus::Infeasible => "INFEASIBLE",
            SolveStatus::ModelInvalid => "MODEL_INVALID",
            SolveStatus::Unknown => "UNKNOWN",
        }
    }

    /// Whether variable values are available.
    pub fn is_solution_found(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Budget passed through to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverParams {
    /// Wall-clock budget in seconds.
    pub max_time_seconds: f64,
    /// Number of parallel search workers.
    pub num_workers: usize,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            max_time_seconds: 30.0,
            num_workers: 6,
        }
    }
}

impl SolverParams {
    pub fn with_max_time_seconds(mut self, seconds: f64) -> Self {
        self.max_time_seconds = seconds;
        self
    }

    pub fn with_num_workers(mut self, workers: usize) -> Self {
        self.num_workers = workers;
        self
    }

    /// Time budget as a duration. Negative or non-finite budgets are zero.
    pub fn max_time(&self) -> Duration {
        Duration::try_from_secs_f64(self.max_time_seconds).unwrap_or(Duration::ZERO)
    }
}

/// Result of a solve call.
#[derive(Debug, Clone, PartialEq)]
pub struct CpSolution {
    pub status: SolveStatus,
    /// One value per model variable; empty when no solution was found.
    pub values: Vec<i64>,
    /// Objective value, when the model has one and a solution was found.
    pub objective_value: Option<i64>,
}

impl CpSolution {
    /// A solution without values.
    pub fn empty(status: SolveStatus) -> Self {
        Self {
            status,
            values: Vec::new(),
            objective_value: None,
        }
    }

    pub fn is_solution_found(&self) -> bool {
        self.status.is_solution_found() && !self.values.is_empty()
    }

    /// Value of an integer variable.
    pub fn value(&self, var: IntVar) -> Option<i64> {
        self.values.get(var.index()).copied()
    }

    /// Value of a boolean variable.
    pub fn bool_value(&self, var: BoolVar) -> Option<bool> {
        self.value(var.as_int()).map(|v| v != 0)
    }

    /// Truth value of a literal.
    pub fn literal_value(&self, lit: Literal) -> Option<bool> {
        self.values.get(lit.index()).map(|&v| lit.holds(v))
    }
}

/// A constraint-programming backend.
pub trait Solver: Send + Sync {
    /// Solves the model within the given budget.
    fn solve(&self, model: &CpModel, params: &SolverParams) -> CpSolution;
}
