//! Constraint compiler.
//!
//! Posts the structural constraints over ignited instances:
//!
//! - dependency: `pred.end <= succ.start`, enforced by the recipe flag
//! - resource exclusivity: one no-overlap per resource code
//! - single recipe: exactly one candidate per order
//! - optional groups: exactly one member of each group when the recipe is chosen

use std::collections::BTreeMap;

use crate::cp::{CpModel, IntervalVar, LinearExpr, Literal};
use crate::models::Resource;

use super::ignition::{OrTuple, RecipeInstance};

/// Intervals competing for each resource code, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct ResourceIntervals {
    by_code: BTreeMap<String, Vec<IntervalVar>>,
}

impl ResourceIntervals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, resource: &Resource, interval: IntervalVar) {
        self.by_code
            .entry(resource.code.clone())
            .or_default()
            .push(interval);
    }

    /// Process intervals of an instance, once per required resource.
    pub fn add_instance(&mut self, instance: &RecipeInstance) {
        for (process, tuple) in instance.template.nodes().iter().zip(&instance.nodes) {
            for resource in &process.resources {
                self.push(resource, tuple.interval);
            }
        }
        for ((u, v), tuple) in instance.transition_tuples() {
            let (pred, succ) = (instance.template.node(u), instance.template.node(v));
            for resource in pred.common_resources(succ) {
                self.push(resource, tuple.interval);
            }
        }
    }

    /// Fixed intervals of committed plans.
    pub fn add_fixed(&mut self, fixed: &[(Resource, OrTuple)]) {
        for (resource, tuple) in fixed {
            self.push(resource, tuple.interval);
        }
    }

    pub fn get(&self, code: &str) -> Option<&[IntervalVar]> {
        self.by_code.get(code).map(Vec::as_slice)
    }

    pub fn resource_count(&self) -> usize {
        self.by_code.len()
    }
}

/// Dependency constraints along every template edge.
pub fn add_dependencies(model: &mut CpModel, instance: &RecipeInstance) {
    let flag = instance.recipe_flag.literal();
    for &(u, v) in &instance.edges {
        model
            .add_less_or_equal(instance.nodes[u].end, instance.nodes[v].start)
            .only_enforce_if([flag]);
    }
}

/// One no-overlap constraint per resource with more than one interval.
/// Returns the number of constraints posted.
pub fn add_resource_no_overlap(model: &mut CpModel, intervals: &ResourceIntervals) -> usize {
    let mut posted = 0;
    for group in intervals.by_code.values().filter(|g| g.len() > 1) {
        model.add_no_overlap(group.clone());
        posted += 1;
    }
    posted
}

/// Exactly one candidate recipe per order.
pub fn add_single_recipe<'a>(
    model: &mut CpModel,
    instances: impl IntoIterator<Item = &'a RecipeInstance>,
) {
    let flags = LinearExpr::sum(instances.into_iter().map(|i| i.recipe_flag.as_int()));
    model.add_equality(flags, 1);
}

/// Exactly one member of each optional group when the recipe is chosen,
/// none otherwise; every member implies the recipe flag.
pub fn add_optional_groups(model: &mut CpModel, instance: &RecipeInstance) {
    let flag = instance.recipe_flag.literal();
    for members in instance.template.optional_groups().values() {
        let literals: Vec<Literal> = members.iter().map(|&i| instance.node_literal(i)).collect();
        let mut sum = LinearExpr::new();
        for literal in &literals {
            sum.add_scaled(1, &literal.to_expr());
        }

        model.add_equality(sum.clone(), 1).only_enforce_if([flag]);
        model.add_equality(sum, 0).only_enforce_if([!flag]);
        for literal in literals {
            model.add_implication(literal, flag);
        }
    }
}
