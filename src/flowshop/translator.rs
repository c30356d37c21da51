//! Solution translator.
//!
//! Turns solver values back into absolute-time plans, and stops into
//! blocking plans merged per resource.

use std::collections::BTreeMap;

use tracing::debug;

use crate::cp::CpSolution;
use crate::models::{squash_intervals, Pivot, Plan, ProcessLink, Program, Stop};

use super::ignition::RecipeInstance;

/// Emits the plans of a chosen instance into `program`.
///
/// Every active node yields one plan per required resource. Returns the
/// number of plans added; an unchosen instance adds none.
pub fn insert_plans(
    program: &mut Program,
    solution: &CpSolution,
    instance: &RecipeInstance,
    pivot: &Pivot,
) -> usize {
    if solution.bool_value(instance.recipe_flag) != Some(true) {
        return 0;
    }

    let mut added = 0;
    for (i, (process, tuple)) in instance
        .template
        .nodes()
        .iter()
        .zip(&instance.nodes)
        .enumerate()
    {
        if solution.literal_value(instance.node_literal(i)) != Some(true) {
            continue;
        }
        let (Some(start), Some(end)) = (solution.value(tuple.start), solution.value(tuple.end))
        else {
            continue;
        };
        let link = ProcessLink::new(
            process.code.as_str(),
            instance.order.code.as_str(),
            instance.template.code(),
            instance.order.material.code.as_str(),
        );
        for resource in &process.resources {
            program.add_plan(Plan::process(
                resource.clone(),
                pivot.to_datetime(start),
                pivot.to_datetime(end),
                link.clone(),
            ));
            added += 1;
        }
    }

    debug!(
        order = %instance.order.code,
        recipe = instance.template.code(),
        plans = added,
        "instance translated"
    );
    added
}

/// Adds one blocking plan per stop and resource, merging overlapping
/// stops of the same resource. Returns the number of plans added.
pub fn insert_stops(program: &mut Program, stops: &[Stop]) -> usize {
    let mut by_resource: BTreeMap<&str, Vec<Plan>> = BTreeMap::new();
    for stop in stops {
        for resource in &stop.resources {
            by_resource
                .entry(resource.code.as_str())
                .or_default()
                .push(Plan::stop(
                    resource.clone(),
                    stop.start_at,
                    stop.end_at,
                    stop.code.as_str(),
                    stop.reason.as_str(),
                ));
        }
    }

    let mut added = 0;
    for plans in by_resource.into_values() {
        for plan in squash_intervals(plans) {
            program.add_plan(plan);
            added += 1;
        }
    }
    added
}
