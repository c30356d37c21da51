//! Objective compiler.
//!
//! # Targets
//! - **completion-time** (`makespan`): the latest end over all active nodes
//!   of all instances. Inactive nodes contribute 0.
//! - **transition-total** (`transitions`): the summed duration of all
//!   active transition intervals of locked instances.
//!
//! Selected targets are summed into one expression, minimized or maximized
//! as configured. With no target the model is a pure feasibility problem.
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 2.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cp::{CpModel, IntVar, LinearExpr, Literal};
use crate::error::PlanningError;

use super::ignition::{OrTuple, RecipeInstance};

/// Magnitude cap on the completion-time variable's bounds.
const HORIZON_CAP: i64 = 1 << 28;

/// An objective term. Defaults to completion time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    #[default]
    #[serde(rename = "completion-time", alias = "makespan")]
    CompletionTime,
    #[serde(rename = "transition-total", alias = "transitions")]
    TransitionTotal,
}

impl Target {
    pub fn as_str(self) -> &'static str {
        match self {
            Target::CompletionTime => "completion-time",
            Target::TransitionTotal => "transition-total",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Target {
    type Err = PlanningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "completion-time" | "makespan" => Ok(Target::CompletionTime),
            "transition-total" | "transitions" => Ok(Target::TransitionTotal),
            other => Err(PlanningError::Config(format!("unknown target: {other}"))),
        }
    }
}

/// Direction of optimization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationMode {
    #[default]
    Minimize,
    Maximize,
}

impl FromStr for OptimizationMode {
    type Err = PlanningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minimize" | "min" => Ok(OptimizationMode::Minimize),
            "maximize" | "max" => Ok(OptimizationMode::Maximize),
            other => Err(PlanningError::Config(format!("unknown mode: {other}"))),
        }
    }
}

/// Variables holding each compiled target's value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledObjective {
    pub terms: Vec<(Target, LinearExpr)>,
}

impl CompiledObjective {
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// The summed expression.
    pub fn total(&self) -> LinearExpr {
        let mut total = LinearExpr::new();
        for (_, expr) in &self.terms {
            total.add_scaled(1, expr);
        }
        total
    }

    /// Value of a target under a solved assignment.
    pub fn evaluate(&self, target: Target, values: &[i64]) -> Option<i64> {
        self.terms
            .iter()
            .find(|(t, _)| *t == target)
            .map(|(_, expr)| expr.evaluate(values))
    }
}

/// Compiles `targets` over `instances` and sets the model objective.
pub fn compile_objective(
    model: &mut CpModel,
    instances: &[RecipeInstance],
    targets: &[Target],
    mode: OptimizationMode,
) -> CompiledObjective {
    let mut compiled = CompiledObjective::default();
    for &target in targets {
        let expr = match target {
            Target::CompletionTime => completion_time(model, instances),
            Target::TransitionTotal => transition_total(model, instances),
        };
        compiled.terms.push((target, expr));
    }

    if !compiled.is_empty() {
        let total = compiled.total();
        match mode {
            OptimizationMode::Minimize => model.minimize(total),
            OptimizationMode::Maximize => model.maximize(total),
        }
    }
    compiled
}

/// `value` when `active`, 0 otherwise. The domain keeps `value`'s own
/// range, so values before the pivot stay reachable.
fn gated(model: &mut CpModel, active: Literal, value: IntVar, name: String) -> IntVar {
    let domain = model.domain(value);
    let aux = model.new_int_var(domain.lb.min(0), domain.ub.max(0), name);
    model
        .add_equality(LinearExpr::from(aux).minus(&value.into()), 0)
        .only_enforce_if([active]);
    model
        .add_equality(LinearExpr::from(aux), 0)
        .only_enforce_if([!active]);
    aux
}

fn completion_time(model: &mut CpModel, instances: &[RecipeInstance]) -> LinearExpr {
    let mut ends = Vec::new();
    for instance in instances {
        for (i, tuple) in instance.nodes.iter().enumerate() {
            let name = format!(
                "{}_{}_{}_completion",
                instance.order.code,
                instance.template.code(),
                instance.template.node(i).code
            );
            ends.push(gated(model, instance.node_literal(i), tuple.end, name));
        }
    }
    if ends.is_empty() {
        return LinearExpr::constant(0);
    }

    let lb = ends
        .iter()
        .map(|&v| model.domain(v).lb)
        .min()
        .unwrap_or(0)
        .max(-HORIZON_CAP);
    let ub = ends
        .iter()
        .map(|&v| model.domain(v).ub)
        .max()
        .unwrap_or(HORIZON_CAP)
        .min(HORIZON_CAP);
    let makespan = model.new_int_var(lb, ub, "completion_time");
    model.add_max_equality(makespan, ends.into_iter().map(LinearExpr::from).collect());
    LinearExpr::from(makespan)
}

fn transition_total(model: &mut CpModel, instances: &[RecipeInstance]) -> LinearExpr {
    let mut total = LinearExpr::new();
    for instance in instances {
        let tuples: Vec<OrTuple> = instance.transition_tuples().map(|(_, t)| *t).collect();
        for (k, tuple) in tuples.into_iter().enumerate() {
            let Some(active) = tuple.active else {
                continue;
            };
            let name = format!(
                "{}_{}_transition{k}_cost",
                instance.order.code,
                instance.template.code()
            );
            total.add_term(1, gated(model, active, tuple.duration, name));
        }
    }
    total
}
