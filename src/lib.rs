//! Recipe-driven flow-shop scheduling.
//!
//! Turns production recipes (DAGs of process steps on resources) and a
//! demand (orders for materials within time windows) into a constraint
//! model, hands it to a solver, and translates the result into a program
//! of absolute-time resource plans. A solver-free heuristic repairs
//! resource overlaps in existing programs.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Recipe`, `Process`, `Resource`, `Order`,
//!   `Demand`, `Program`, `Plan`, `Stop`, `TimeScale`
//! - **`graph`**: Pruned recipe templates and per-order plan graphs
//! - **`duration`**: Named duration functions resolved per order
//! - **`catalog`**: Registered templates by produced material
//! - **`cp`**: Constraint model, the `Solver` contract and a small backend
//! - **`flowshop`**: Ignition, constraints, objective, translation, planner
//! - **`repair`**: Overlap-repair heuristic
//! - **`validation`**: Input integrity checks (windows, codes, DAG cycles)
//! - **`config`**, **`error`**, **`logging`**: Ambient plumbing
//!
//! # Architecture
//!
//! The crate owns the scheduling domain and the model compiler. Solving is
//! behind the [`cp::Solver`] trait so a production constraint solver can
//! be plugged in; [`cp::PumpkinSolver`] is bundled.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Baptiste, Le Pape & Nuijten (2001), "Constraint-Based Scheduling"
//! - Laborie et al. (2018), "IBM ILOG CP Optimizer for Scheduling"

pub mod catalog;
pub mod config;
pub mod cp;
pub mod duration;
pub mod error;
pub mod flowshop;
pub mod graph;
pub mod logging;
pub mod models;
pub mod repair;
pub mod validation;

pub use catalog::RecipeCatalog;
pub use config::{PlannerConfig, RepairConfig};
pub use error::{PlanningError, Result};
pub use flowshop::{FlowShop, FlowShopOutcome, OptimizationMode, Target};
pub use repair::{OverlapRepair, RepairOutcome, RepairStatus};
