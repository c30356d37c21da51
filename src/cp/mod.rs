//! Constraint-programming model and solver contract.
//!
//! The flow-shop compiler ([`crate::flowshop`]) writes into a [`CpModel`]:
//! bounded integer and boolean variables, optional interval variables gated
//! by a literal, linear / no-overlap / max-equality / and-equality
//! constraints with enforcement literals, and one linear objective. Any
//! backend implementing [`Solver`] can then solve it.
//!
//! [`PumpkinSolver`] is the bundled backend; it hands the model to the
//! `pumpkin-solver` lazy clause generation engine.
//!
//! # Reference
//! - Laborie et al. (2018), "IBM ILOG CP Optimizer for Scheduling"
//! - Baptiste et al. (2001), "Constraint-Based Scheduling"

mod model;
mod pumpkin;
mod solver;

pub use model::{
    BoolVar, Constraint, ConstraintKind, CpModel, Domain, IntVar, IntervalInfo, IntervalVar,
    LinearExpr, Literal, Objective, Sense, VarInfo,
};
pub use pumpkin::PumpkinSolver;
pub use solver::{CpSolution, SolveStatus, Solver, SolverParams};
