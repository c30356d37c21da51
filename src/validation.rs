//! Input validation for flow-shop planning.
//!
//! Checks structural integrity of recipes, demands, stops and programs
//! before they are accepted by a planner. Detects:
//! - Duplicate codes
//! - Inverted time windows
//! - Quantities below zero and priorities outside [0, 100]
//! - Empty demands, recipes without processes or produced materials
//! - Processes without resources or duration function
//! - Stops without reason or resources
//! - Links to unknown processes and circular process dependencies
//!
//! Every check runs; all problems are reported together.
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4 (Topological Sort)

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::graph::Dag;
use crate::models::{Demand, Order, PlanLink, Program, Recipe, Stop};

/// Lowest accepted order priority.
pub const PRIORITY_MIN: i32 = 0;
/// Highest accepted order priority.
pub const PRIORITY_MAX: i32 = 100;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities share the same code.
    DuplicateId,
    /// A required code is empty.
    EmptyCode,
    /// A window starts after it ends.
    InvalidWindow,
    /// An order quantity is negative.
    NegativeQuantity,
    /// An order priority is outside [0, 100].
    PriorityOutOfRange,
    /// A demand has no orders.
    EmptyDemand,
    /// A recipe has no processes.
    EmptyRecipe,
    /// A recipe produces no material.
    MissingMaterial,
    /// A process or stop has no resource.
    MissingResource,
    /// A process names no duration function.
    MissingDurationFunction,
    /// A stop has no reason.
    MissingReason,
    /// A process links to a process that is not in its recipe.
    InvalidPredecessor,
    /// Process links contain a cycle.
    CyclicDependency,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

fn finish(errors: Vec<ValidationError>) -> ValidationResult {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates a batch of recipes.
///
/// Checks:
/// 1. No duplicate recipe codes, non-empty codes
/// 2. Every recipe has processes and produces at least one material
/// 3. No duplicate process codes within a recipe
/// 4. Every process names a duration function and requires a resource
/// 5. Every link points to a process of the same recipe
/// 6. No circular process dependencies
pub fn validate_recipes(recipes: &[Recipe]) -> ValidationResult {
    let mut errors = Vec::new();
    let mut recipe_codes = HashSet::new();

    for recipe in recipes {
        if recipe.code.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyCode,
                "Recipe without code",
            ));
        } else if !recipe_codes.insert(recipe.code.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate recipe code: {}", recipe.code),
            ));
        }

        if recipe.processes.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyRecipe,
                format!("Recipe '{}' has no processes", recipe.code),
            ));
        }
        if recipe.materials.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::MissingMaterial,
                format!("Recipe '{}' produces no material", recipe.code),
            ));
        }

        validate_processes(recipe, &mut errors);
    }

    finish(errors)
}

fn validate_processes(recipe: &Recipe, errors: &mut Vec<ValidationError>) {
    let mut index: HashMap<&str, usize> = HashMap::new();
    for (i, process) in recipe.processes.iter().enumerate() {
        if process.code.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyCode,
                format!("Recipe '{}' has a process without code", recipe.code),
            ));
        } else if index.insert(process.code.as_str(), i).is_some() {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!(
                    "Duplicate process code '{}' in recipe '{}'",
                    process.code, recipe.code
                ),
            ));
        }
        if process.duration_fn.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::MissingDurationFunction,
                format!("Process '{}' has no duration function", process.code),
            ));
        }
        if process.resources.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::MissingResource,
                format!("Process '{}' requires no resource", process.code),
            ));
        }
    }

    // Links and cycles
    let mut dag = Dag::new(recipe.processes.len());
    for (u, process) in recipe.processes.iter().enumerate() {
        let links = process
            .successors
            .iter()
            .map(|code| (code, true))
            .chain(process.predecessors.iter().map(|code| (code, false)));
        for (code, is_successor) in links {
            match index.get(code.as_str()) {
                Some(&v) if is_successor => {
                    dag.add_edge(u, v);
                }
                Some(&v) => {
                    dag.add_edge(v, u);
                }
                None => errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidPredecessor,
                    format!(
                        "Process '{}' of recipe '{}' links to unknown process '{}'",
                        process.code, recipe.code, code
                    ),
                )),
            }
        }
    }
    if dag.topological_order().is_none() {
        errors.push(ValidationError::new(
            ValidationErrorKind::CyclicDependency,
            format!("Circular dependency detected in recipe '{}'", recipe.code),
        ));
    }
}

fn validate_order(order: &Order, errors: &mut Vec<ValidationError>) {
    if order.code.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyCode,
            "Order without code",
        ));
    }
    if order.start_at > order.end_at {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidWindow,
            format!("Order '{}' starts after it ends", order.code),
        ));
    }
    if order.quantity < 0.0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::NegativeQuantity,
            format!("Order '{}' has negative quantity {}", order.code, order.quantity),
        ));
    }
    if !(PRIORITY_MIN..=PRIORITY_MAX).contains(&order.priority) {
        errors.push(ValidationError::new(
            ValidationErrorKind::PriorityOutOfRange,
            format!(
                "Order '{}' priority {} outside [{PRIORITY_MIN}, {PRIORITY_MAX}]",
                order.code, order.priority
            ),
        ));
    }
}

/// Validates a demand and its orders.
pub fn validate_demand(demand: &Demand) -> ValidationResult {
    let mut errors = Vec::new();

    if demand.start_at > demand.end_at {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidWindow,
            format!("Demand '{}' starts after it ends", demand.code),
        ));
    }
    if demand.orders.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyDemand,
            format!("Demand '{}' has no orders", demand.code),
        ));
    }

    let mut order_codes = HashSet::new();
    for order in &demand.orders {
        if !order.code.is_empty() && !order_codes.insert(order.code.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate order code: {}", order.code),
            ));
        }
        validate_order(order, &mut errors);
    }

    finish(errors)
}

/// Validates stops.
pub fn validate_stops(stops: &[Stop]) -> ValidationResult {
    let mut errors = Vec::new();
    let mut codes = HashSet::new();

    for stop in stops {
        if !codes.insert(stop.code.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate stop code: {}", stop.code),
            ));
        }
        if stop.reason.trim().is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::MissingReason,
                format!("Stop '{}' has no reason", stop.code),
            ));
        }
        if stop.resources.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::MissingResource,
                format!("Stop '{}' blocks no resource", stop.code),
            ));
        }
        if stop.start_at > stop.end_at {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidWindow,
                format!("Stop '{}' starts after it ends", stop.code),
            ));
        }
    }

    finish(errors)
}

/// Validates a program and its plans.
///
/// Each plan needs a resource, a non-inverted window and a link with
/// non-empty codes.
pub fn validate_program(program: &Program) -> ValidationResult {
    let mut errors = Vec::new();

    if program.start_at > program.end_at {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidWindow,
            format!("Program '{}' starts after it ends", program.code),
        ));
    }

    for (i, plan) in program.plans.iter().enumerate() {
        if plan.resource.code.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::MissingResource,
                format!("Plan #{i} has no resource"),
            ));
        }
        if plan.start_at > plan.end_at {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidWindow,
                format!("Plan #{i} on '{}' starts after it ends", plan.resource.code),
            ));
        }
        let linked = match &plan.link {
            PlanLink::Process(link) => {
                !(link.process.is_empty() || link.order.is_empty() || link.recipe.is_empty())
            }
            PlanLink::Stop { stop, .. } => !stop.is_empty(),
        };
        if !linked {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyCode,
                format!("Plan #{i} on '{}' has an incomplete link", plan.resource.code),
            ));
        }
    }

    finish(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Material, Plan, Process, ProcessLink, Resource};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t(h: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(h)
    }

    fn sample_recipe() -> Recipe {
        Recipe::new("R1")
            .with_material(Material::new("beer"))
            .with_process(
                Process::new("MASH", "mash_time")
                    .with_resource(Resource::processor("K1"))
                    .with_successor("BOIL"),
            )
            .with_process(Process::new("BOIL", "boil_time").with_resource(Resource::processor("K2")))
    }

    fn sample_demand() -> Demand {
        Demand::new("D1", t(0), t(24))
            .with_order(Order::new("O1", Material::new("beer"), t(0), t(12)).with_priority(50))
            .with_order(Order::new("O2", Material::new("beer"), t(4), t(24)).with_quantity(10.0))
    }

    fn has_kind(errors: &[ValidationError], kind: ValidationErrorKind) -> bool {
        errors.iter().any(|e| e.kind == kind)
    }

    #[test]
    fn test_valid_recipe() {
        assert!(validate_recipes(&[sample_recipe()]).is_ok());
    }

    #[test]
    fn test_duplicate_recipe_code() {
        let errors = validate_recipes(&[sample_recipe(), sample_recipe()]).unwrap_err();
        assert!(has_kind(&errors, ValidationErrorKind::DuplicateId));
    }

    #[test]
    fn test_empty_recipe() {
        let errors = validate_recipes(&[Recipe::new("R0")]).unwrap_err();
        assert!(has_kind(&errors, ValidationErrorKind::EmptyRecipe));
        assert!(has_kind(&errors, ValidationErrorKind::MissingMaterial));
    }

    #[test]
    fn test_process_requirements() {
        let recipe = Recipe::new("R1")
            .with_material(Material::new("beer"))
            .with_process(Process::new("A", ""));
        let errors = validate_recipes(&[recipe]).unwrap_err();
        assert!(has_kind(&errors, ValidationErrorKind::MissingDurationFunction));
        assert!(has_kind(&errors, ValidationErrorKind::MissingResource));
    }

    #[test]
    fn test_unknown_link() {
        let recipe = sample_recipe().with_process(
            Process::new("FILL", "f")
                .with_resource(Resource::processor("F1"))
                .with_predecessor("NONEXISTENT"),
        );
        let errors = validate_recipes(&[recipe]).unwrap_err();
        assert!(has_kind(&errors, ValidationErrorKind::InvalidPredecessor));
    }

    #[test]
    fn test_cyclic_dependency() {
        // MASH -> BOIL -> COOL -> MASH
        let r = || Resource::processor("K1");
        let recipe = Recipe::new("R1")
            .with_material(Material::new("beer"))
            .with_process(Process::new("MASH", "f").with_resource(r()).with_successor("BOIL"))
            .with_process(Process::new("BOIL", "f").with_resource(r()).with_successor("COOL"))
            .with_process(Process::new("COOL", "f").with_resource(r()).with_successor("MASH"));
        let errors = validate_recipes(&[recipe]).unwrap_err();
        assert!(has_kind(&errors, ValidationErrorKind::CyclicDependency));
    }

    #[test]
    fn test_valid_demand() {
        assert!(validate_demand(&sample_demand()).is_ok());
    }

    #[test]
    fn test_demand_errors() {
        let demand = Demand::new("D1", t(5), t(1))
            .with_order(Order::new("O1", Material::new("beer"), t(3), t(2)).with_quantity(-1.0))
            .with_order(Order::new("O1", Material::new("beer"), t(0), t(1)).with_priority(101));
        let errors = validate_demand(&demand).unwrap_err();
        assert!(has_kind(&errors, ValidationErrorKind::InvalidWindow));
        assert!(has_kind(&errors, ValidationErrorKind::NegativeQuantity));
        assert!(has_kind(&errors, ValidationErrorKind::PriorityOutOfRange));
        assert!(has_kind(&errors, ValidationErrorKind::DuplicateId));
        assert!(errors.len() >= 5);
    }

    #[test]
    fn test_empty_demand() {
        let errors = validate_demand(&Demand::new("D0", t(0), t(1))).unwrap_err();
        assert!(has_kind(&errors, ValidationErrorKind::EmptyDemand));
    }

    #[test]
    fn test_stops() {
        let ok = Stop::new("S1", "cleaning", t(0), t(1)).with_resource(Resource::processor("K1"));
        assert!(validate_stops(&[ok]).is_ok());

        let bad = Stop::new("S2", " ", t(2), t(1));
        let errors = validate_stops(&[bad]).unwrap_err();
        assert!(has_kind(&errors, ValidationErrorKind::MissingReason));
        assert!(has_kind(&errors, ValidationErrorKind::MissingResource));
        assert!(has_kind(&errors, ValidationErrorKind::InvalidWindow));
    }

    #[test]
    fn test_program() {
        let good = Program::new("P1", t(0), t(4)).with_plan(Plan::process(
            Resource::processor("K1"),
            t(0),
            t(2),
            ProcessLink::new("MASH", "O1", "R1", "beer"),
        ));
        assert!(validate_program(&good).is_ok());

        let bad = good
            .clone()
            .with_plan(Plan::stop(Resource::processor(""), t(3), t(2), "", "x"));
        let errors = validate_program(&bad).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors[0].to_string().contains("no resource"));
    }
}
