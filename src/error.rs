//! Error types.
//!
//! Structural problems (bad recipes, unlinked duration functions, unknown
//! materials) are errors raised before any variable is allocated. Solver
//! outcomes are never errors; they are reported as statuses.

use thiserror::Error;

use crate::validation::ValidationError;

/// Recipe graph construction errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("recipe '{recipe}' contains a dependency cycle")]
    Cycle { recipe: String },

    #[error("recipe '{recipe}' links to unknown process '{process}'")]
    UnknownProcess { recipe: String, process: String },

    #[error("recipe '{recipe}' declares process '{process}' more than once")]
    DuplicateProcess { recipe: String, process: String },
}

/// Duration function registration and evaluation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DurationError {
    #[error("invalid duration function code: '{0}'")]
    InvalidCode(String),

    #[error("duration function '{code}' used by process '{process}' is not linked")]
    Unlinked { code: String, process: String },

    #[error("duration function '{code}' returned {value} for process '{process}' of order '{order}'")]
    Negative {
        code: String,
        process: String,
        order: String,
        value: i64,
    },
}

/// Recipe catalog lookup errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("no recipe produces material '{material}' (order '{order}')")]
    NoRecipe { order: String, material: String },

    #[error("recipe '{recipe}' for material '{material}' is not registered")]
    UnknownRecipe { material: String, recipe: String },
}

/// Overlap-repair errors. Non-convergence is not one of them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepairError {
    #[error("plans of order '{order}' reference more than one recipe")]
    MixedRecipes { order: String },

    #[error("plans of order '{order}' reference process '{process}' unknown to recipe '{recipe}'")]
    UnknownProcess {
        order: String,
        recipe: String,
        process: String,
    },

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Umbrella error for planning runs.
#[derive(Error, Debug)]
pub enum PlanningError {
    #[error("input rejected with {} validation error(s)", .0.len())]
    Validation(Vec<ValidationError>),

    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("duration error: {0}")]
    Duration(#[from] DurationError),

    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("repair error: {0}")]
    Repair(#[from] RepairError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("configuration parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<Vec<ValidationError>> for PlanningError {
    fn from(errors: Vec<ValidationError>) -> Self {
        PlanningError::Validation(errors)
    }
}

/// Result alias for planning operations.
pub type Result<T> = std::result::Result<T, PlanningError>;
