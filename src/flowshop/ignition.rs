//! Model ignition: decision-variable allocation.
//!
//! For every (order, candidate recipe) pair a [`RecipeInstance`] is
//! created over the shared template. It owns a recipe-level flag and one
//! [`OrTuple`] per template node; locked templates also get one transition
//! tuple per resource-sharing edge. Committed plans become fixed tuples.

use std::sync::Arc;

use crate::cp::{BoolVar, CpModel, IntVar, IntervalVar, Literal};
use crate::graph::RecipeTemplate;
use crate::models::{Order, Pivot, Plan, Program, Resource};

/// Variables of one interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrTuple {
    /// Presence literal. `None` for fixed commitments.
    pub active: Option<Literal>,
    pub start: IntVar,
    pub end: IntVar,
    pub duration: IntVar,
    pub interval: IntervalVar,
}

/// One instantiation of a template for one order.
///
/// `durations` and `nodes` are indexed like the template's nodes;
/// `transitions` like `edges`.
#[derive(Debug, Clone)]
pub struct RecipeInstance {
    pub template: Arc<RecipeTemplate>,
    pub order: Order,
    pub durations: Vec<i64>,
    pub recipe_flag: BoolVar,
    pub nodes: Vec<OrTuple>,
    pub edges: Vec<(usize, usize)>,
    pub transitions: Vec<Option<OrTuple>>,
}

impl RecipeInstance {
    /// Active literal of node `idx` (own flag if optional, recipe flag otherwise).
    pub fn node_literal(&self, idx: usize) -> Literal {
        self.nodes[idx]
            .active
            .unwrap_or_else(|| self.recipe_flag.literal())
    }

    /// Created transition tuples with their edge.
    pub fn transition_tuples(&self) -> impl Iterator<Item = ((usize, usize), &OrTuple)> {
        self.edges
            .iter()
            .zip(&self.transitions)
            .filter_map(|(&edge, t)| t.as_ref().map(|t| (edge, t)))
    }

    fn var_name(&self, suffix: &str) -> String {
        format!("{}_{}_{}", self.order.code, self.template.code(), suffix)
    }
}

/// Allocates the variables of `template` for `order`.
///
/// Start and end of every node are bounded by the order's window; the
/// duration is fixed to the resolved value; the interval is gated by the
/// node's own flag when the process is optional and by the recipe flag
/// otherwise.
pub fn ignite_recipe(
    model: &mut CpModel,
    template: Arc<RecipeTemplate>,
    order: &Order,
    durations: Vec<i64>,
    pivot: &Pivot,
) -> RecipeInstance {
    let lo = pivot.to_int(order.start_at);
    let hi = pivot.to_int(order.end_at);
    let prefix = format!("{}_{}", order.code, template.code());
    let recipe_flag = model.new_bool_var(format!("{prefix}_recipe"));

    let nodes = template
        .nodes()
        .iter()
        .zip(&durations)
        .map(|(process, &duration)| {
            let name = format!("{prefix}_{}", process.code);
            let active = if process.is_optional() {
                model.new_bool_var(format!("{name}_active")).literal()
            } else {
                recipe_flag.literal()
            };
            let start = model.new_int_var(lo, hi, format!("{name}_start"));
            let end = model.new_int_var(lo, hi, format!("{name}_end"));
            let duration = model.new_constant(duration, format!("{name}_duration"));
            let interval =
                model.new_optional_interval_var(start, duration, end, active, format!("{name}_interval"));
            OrTuple {
                active: Some(active),
                start,
                end,
                duration,
                interval,
            }
        })
        .collect();

    let edges = template.edges();
    let transitions = vec![None; edges.len()];

    RecipeInstance {
        template,
        order: order.clone(),
        durations,
        recipe_flag,
        nodes,
        edges,
        transitions,
    }
}

/// Adds transition tuples to a locked instance.
///
/// For every edge whose endpoints share a resource, the transition starts
/// at the predecessor's end, ends at the successor's start, and is active
/// when both endpoints are. Its duration may span from the predecessor's
/// earliest start to the successor's latest end.
pub fn ignite_transitions(model: &mut CpModel, instance: &mut RecipeInstance) -> usize {
    let mut created = 0;
    for (k, &(u, v)) in instance.edges.iter().enumerate() {
        let (pred, succ) = (instance.template.node(u), instance.template.node(v));
        if !pred.shares_resource(succ) {
            continue;
        }
        let (pred_t, succ_t) = (instance.nodes[u], instance.nodes[v]);
        let name = instance.var_name(&format!("{}_{}_transition", pred.code, succ.code));

        let span = model.domain(succ_t.end).ub - model.domain(pred_t.start).lb;
        let duration = model.new_int_var(0, span.max(0), format!("{name}_duration"));
        let active = model.new_bool_var(format!("{name}_active")).literal();
        model.add_bool_and_equality(
            active,
            vec![instance.node_literal(u), instance.node_literal(v)],
        );
        let interval = model.new_optional_interval_var(
            pred_t.end,
            duration,
            succ_t.start,
            active,
            format!("{name}_interval"),
        );

        instance.transitions[k] = Some(OrTuple {
            active: Some(active),
            start: pred_t.end,
            end: succ_t.start,
            duration,
            interval,
        });
        created += 1;
    }
    created
}

/// Fixed tuples for committed plans, paired with their resource.
pub fn ignite_program(
    model: &mut CpModel,
    program: &Program,
    pivot: &Pivot,
) -> Vec<(Resource, OrTuple)> {
    program
        .plans
        .iter()
        .enumerate()
        .map(|(i, plan)| (plan.resource.clone(), ignite_plan(model, plan, i, pivot)))
        .collect()
}

fn ignite_plan(model: &mut CpModel, plan: &Plan, i: usize, pivot: &Pivot) -> OrTuple {
    let name = format!("plan{i}_{}", plan.resource.code);
    let s = pivot.to_int(plan.start_at);
    let e = pivot.to_int(plan.end_at).max(s);
    let start = model.new_constant(s, format!("{name}_start"));
    let end = model.new_constant(e, format!("{name}_end"));
    let duration = model.new_constant(e - s, format!("{name}_duration"));
    let interval = model.new_interval_var(start, duration, end, format!("{name}_interval"));
    OrTuple {
        active: None,
        start,
        end,
        duration,
        interval,
    }
}
