//! Recipe graph builder.
//!
//! Turns recipes into pruned dependency DAGs ([`RecipeTemplate`]) and
//! rebuilds per-order dependency graphs from existing plans
//! ([`PlanGraph`]) for the overlap-repair heuristic.
//!
//! Graphs are arena-indexed: node `i` is the `i`-th process of the recipe
//! and edges are index pairs, so per-instance state can live in parallel
//! arrays instead of copies of the graph.
//!
//! # Reference
//! - Kahn (1962), "Topological sorting of large networks"
//! - Aho, Garey & Ullman (1972), "The Transitive Reduction of a Directed Graph"

mod dag;
mod plan;
mod template;

pub use dag::Dag;
pub use plan::{PlanGraph, PlanNode};
pub use template::RecipeTemplate;
