//! Pumpkin backend.
//!
//! Hands a [`CpModel`] to the `pumpkin-solver` lazy clause generation
//! engine. The engine works on `i32` domains with linear and cumulative
//! constraints, so the rest of the contract is decomposed on the way in:
//!
//! - booleans are `[0, 1]` integers and `¬x` is the term `1 - x`;
//! - an enforced linear bound is relaxed by `M · Σ(1 - lᵢ)`, with `M` the
//!   smallest value that makes the relaxed bound redundant;
//! - an interval link `start + duration = end` is a linear equality
//!   enforced by the presence literal;
//! - no-overlap over always-present fixed-length intervals is a cumulative
//!   of capacity 1; every other pair gets an order boolean and two enforced
//!   precedences. Intervals that can only be empty are left out;
//! - `target = max(eᵢ)` is `target >= eᵢ` plus one selector per term that
//!   pins `target <= eᵢ`;
//! - `t <=> AND(lᵢ)` is `t <= lᵢ` for every `i` and `t >= Σlᵢ - (n - 1)`.
//!
//! The search always optimises one variable: the objective, or a fixed
//! zero for pure feasibility, so the first solution of a satisfaction
//! model comes back proven. Search is single-threaded; `num_workers` is
//! accepted and ignored.
//!
//! # Reference
//! - Feydy & Stuckey (2009), "Lazy Clause Generation Reengineered"
//! - Baptiste, Le Pape & Nuijten (2001), "Constraint-Based Scheduling"

use std::collections::BTreeMap;
use std::time::Instant;

use pumpkin_solver::constraints as pc;
use pumpkin_solver::optimisation::linear_sat_unsat::LinearSatUnsat;
use pumpkin_solver::optimisation::OptimisationDirection;
use pumpkin_solver::results::{OptimisationResult, ProblemSolution, SolutionReference};
use pumpkin_solver::termination::TimeBudget;
use pumpkin_solver::variables::{AffineView, DomainId, TransformableVariable};
use pumpkin_solver::Solver as Engine;
use tracing::{debug, warn};

use super::model::{
    BoolVar, ConstraintKind, CpModel, IntVar, IntervalInfo, IntervalVar, LinearExpr, Literal,
    Sense,
};
use super::solver::{CpSolution, SolveStatus, Solver, SolverParams};

/// Constraint solver backed by `pumpkin-solver`.
///
/// # Example
/// ```
/// use recipe_schedule::cp::{CpModel, LinearExpr, PumpkinSolver, SolveStatus, Solver, SolverParams};
///
/// let mut model = CpModel::new("demo");
/// let x = model.new_int_var(0, 10, "x");
/// let y = model.new_int_var(0, 10, "y");
/// model.add_equality(LinearExpr::sum([x, y]), 7);
/// model.maximize(LinearExpr::from(x));
///
/// let solution = PumpkinSolver::new().solve(&model, &SolverParams::default());
/// assert_eq!(solution.status, SolveStatus::Optimal);
/// assert_eq!(solution.value(x), Some(7));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PumpkinSolver;

impl PumpkinSolver {
    pub fn new() -> Self {
        Self
    }
}

/// Why encoding stopped before the search.
#[derive(Debug)]
enum Abort {
    /// Root propagation already failed.
    Infeasible,
    /// A bound or coefficient does not fit the engine's `i32` arithmetic.
    Overflow(String),
}

fn narrow(value: i128, what: &str) -> Result<i32, Abort> {
    i32::try_from(value).map_err(|_| Abort::Overflow(format!("{what} {value} exceeds i32")))
}

/// Sums coefficients of repeated variables and drops zero terms.
fn merge(terms: Vec<(i64, IntVar)>) -> Vec<(i64, IntVar)> {
    let mut merged: BTreeMap<IntVar, i64> = BTreeMap::new();
    for (coef, var) in terms {
        *merged.entry(var).or_default() += coef;
    }
    merged
        .into_iter()
        .filter(|&(_, coef)| coef != 0)
        .map(|(var, coef)| (coef, var))
        .collect()
}

fn read_values<S: ProblemSolution>(solution: &S, vars: &[DomainId]) -> Vec<i64> {
    vars.iter()
        .map(|&var| i64::from(solution.get_integer_value(var)))
        .collect()
}

fn on_solution<B>(_: &Engine, _: SolutionReference, _: &B) {}

/// Engine variables, indexed like the model's and followed by auxiliaries.
struct Encoder {
    engine: Engine,
    vars: Vec<DomainId>,
    bounds: Vec<(i64, i64)>,
}

impl Encoder {
    fn new(model: &CpModel) -> Result<Self, Abort> {
        let mut encoder = Self {
            engine: Engine::default(),
            vars: Vec::with_capacity(model.var_count()),
            bounds: Vec::with_capacity(model.var_count()),
        };
        for info in model.vars() {
            encoder.new_var(info.domain.lb.into(), info.domain.ub.into(), &info.name)?;
        }
        Ok(encoder)
    }

    fn new_var(&mut self, lb: i128, ub: i128, name: &str) -> Result<IntVar, Abort> {
        let (lo, hi) = (narrow(lb, name)?, narrow(ub, name)?);
        self.vars.push(self.engine.new_bounded_integer(lo, hi));
        self.bounds.push((lo.into(), hi.into()));
        Ok(IntVar(self.vars.len() - 1))
    }

    fn new_bool(&mut self, name: &str) -> Result<Literal, Abort> {
        let var = self.new_var(0, 1, name)?;
        Ok(BoolVar(var.index()).literal())
    }

    /// Smallest and largest value of `Σ terms` over the declared bounds.
    fn range(&self, terms: &[(i64, IntVar)]) -> (i128, i128) {
        terms.iter().fold((0, 0), |(lo, hi), &(coef, var)| {
            let (l, u) = self.bounds[var.index()];
            let (a, b) = (i128::from(coef) * i128::from(l), i128::from(coef) * i128::from(u));
            (lo + a.min(b), hi + a.max(b))
        })
    }

    /// Posts `Σ terms <= rhs`, required only while every literal of
    /// `enforcement` holds.
    fn post_le(
        &mut self,
        terms: Vec<(i64, IntVar)>,
        rhs: i128,
        enforcement: &[Literal],
    ) -> Result<(), Abort> {
        let mut terms = merge(terms);
        let (_, max) = self.range(&terms);
        if max <= rhs {
            return Ok(());
        }
        let mut rhs = rhs;
        if !enforcement.is_empty() {
            // one false literal lifts the bound to the largest reachable sum
            let big_m = i64::try_from(max - rhs)
                .map_err(|_| Abort::Overflow(format!("relaxation {} exceeds i64", max - rhs)))?;
            for &lit in enforcement {
                let var = IntVar(lit.index());
                if lit.is_negated() {
                    terms.push((-big_m, var));
                } else {
                    terms.push((big_m, var));
                    rhs += i128::from(big_m);
                }
            }
            terms = merge(terms);
        }
        self.post_raw(&terms, rhs)
    }

    fn post_raw(&mut self, terms: &[(i64, IntVar)], rhs: i128) -> Result<(), Abort> {
        let (min, max) = self.range(terms);
        if max <= rhs {
            return Ok(());
        }
        if min > rhs {
            return Err(Abort::Infeasible);
        }
        // posted as `Σ -cᵢ·xᵢ >= -rhs`
        let rhs = narrow(-rhs, "linear bound")?;
        let vars = terms
            .iter()
            .map(|&(coef, var)| {
                let coef = narrow(-i128::from(coef), "coefficient")?;
                Ok(self.vars[var.index()].scaled(coef))
            })
            .collect::<Result<Vec<AffineView<DomainId>>, Abort>>()?;
        let tag = self.engine.new_constraint_tag();
        self.engine
            .add_constraint(pc::greater_than_or_equals(vars, rhs, tag))
            .post()
            .map_err(|_| Abort::Infeasible)
    }

    /// `lb <= expr <= ub` under `enforcement`.
    fn post_linear(
        &mut self,
        expr: &LinearExpr,
        lb: i64,
        ub: i64,
        enforcement: &[Literal],
    ) -> Result<(), Abort> {
        let k = i128::from(expr.constant);
        self.post_le(expr.terms.clone(), i128::from(ub) - k, enforcement)?;
        let negated = expr.terms.iter().map(|&(c, v)| (-c, v)).collect();
        self.post_le(negated, k - i128::from(lb), enforcement)
    }

    fn post_interval(&mut self, iv: &IntervalInfo) -> Result<(), Abort> {
        let link = LinearExpr::from(iv.start)
            .with_term(1, iv.duration)
            .with_term(-1, iv.end);
        let presence: Vec<Literal> = iv.presence.into_iter().collect();
        self.post_linear(&link, 0, 0, &presence)
    }

    fn post_no_overlap(
        &mut self,
        model: &CpModel,
        intervals: &[IntervalVar],
        enforcement: &[Literal],
    ) -> Result<(), Abort> {
        let members: Vec<&IntervalInfo> = intervals
            .iter()
            .map(|&iv| model.interval(iv))
            .filter(|iv| self.bounds[iv.duration.index()].1 > 0)
            .collect();
        let rigid: Vec<bool> = members
            .iter()
            .map(|iv| {
                let (lo, hi) = self.bounds[iv.duration.index()];
                enforcement.is_empty() && iv.presence.is_none() && lo == hi
            })
            .collect();

        let fixed: Vec<&IntervalInfo> = (0..members.len())
            .filter(|&k| rigid[k])
            .map(|k| members[k])
            .collect();
        if fixed.len() > 1 {
            self.post_cumulative(&fixed)?;
        }

        for i in 0..members.len() {
            for j in (i + 1)..members.len() {
                if rigid[i] && rigid[j] && fixed.len() > 1 {
                    continue;
                }
                self.post_disjunction(members[i], members[j], enforcement)?;
            }
        }
        Ok(())
    }

    /// Unit-demand cumulative of capacity 1 over mandatory fixed-length tasks.
    fn post_cumulative(&mut self, tasks: &[&IntervalInfo]) -> Result<(), Abort> {
        let starts: Vec<DomainId> = tasks.iter().map(|iv| self.vars[iv.start.index()]).collect();
        let durations = tasks
            .iter()
            .map(|iv| narrow(self.bounds[iv.duration.index()].0.into(), "duration"))
            .collect::<Result<Vec<i32>, Abort>>()?;
        let demands = vec![1; tasks.len()];
        let tag = self.engine.new_constraint_tag();
        self.engine
            .add_constraint(pc::cumulative(starts, durations, demands, 1, tag))
            .post()
            .map_err(|_| Abort::Infeasible)
    }

    /// `a` ends before `b` starts or the other way round, when both are present.
    fn post_disjunction(
        &mut self,
        a: &IntervalInfo,
        b: &IntervalInfo,
        enforcement: &[Literal],
    ) -> Result<(), Abort> {
        let a_first = self.new_bool("order")?;
        let mut lits: Vec<Literal> = enforcement
            .iter()
            .copied()
            .chain(a.presence)
            .chain(b.presence)
            .chain([a_first])
            .collect();
        self.post_le(vec![(1, a.end), (-1, b.start)], 0, &lits)?;
        if let Some(last) = lits.last_mut() {
            *last = !a_first;
        }
        self.post_le(vec![(1, b.end), (-1, a.start)], 0, &lits)
    }

    fn post_max(
        &mut self,
        target: IntVar,
        exprs: &[LinearExpr],
        enforcement: &[Literal],
    ) -> Result<(), Abort> {
        let target_expr = LinearExpr::from(target);
        for expr in exprs {
            self.post_linear(&expr.clone().minus(&target_expr), i64::MIN, 0, enforcement)?;
        }
        if let [only] = exprs {
            return self.post_linear(&target_expr.minus(only), i64::MIN, 0, enforcement);
        }

        let mut picked = LinearExpr::new();
        for expr in exprs {
            let pick = self.new_bool("max_pick")?;
            picked.add_scaled(1, &pick.to_expr());
            let lits: Vec<Literal> = enforcement.iter().copied().chain([pick]).collect();
            self.post_linear(&target_expr.clone().minus(expr), i64::MIN, 0, &lits)?;
        }
        self.post_linear(&picked, 1, i64::MAX, enforcement)
    }

    fn post_and(
        &mut self,
        target: Literal,
        literals: &[Literal],
        enforcement: &[Literal],
    ) -> Result<(), Abort> {
        let t = target.to_expr();
        let mut sum = LinearExpr::new();
        for lit in literals {
            let l = lit.to_expr();
            self.post_linear(&t.clone().minus(&l), i64::MIN, 0, enforcement)?;
            sum.add_scaled(1, &l);
        }
        let n = literals.len() as i64;
        self.post_linear(&sum.minus(&t), i64::MIN, n - 1, enforcement)
    }

    /// The optimised variable and its direction.
    fn objective(&mut self, model: &CpModel) -> Result<(IntVar, OptimisationDirection), Abort> {
        let Some(objective) = model.objective() else {
            let zero = self.new_var(0, 0, "feasibility")?;
            return Ok((zero, OptimisationDirection::Minimise));
        };
        let terms = merge(objective.expr.terms.clone());
        let (lo, hi) = self.range(&terms);
        let k = i128::from(objective.expr.constant);
        let var = self.new_var(lo + k, hi + k, "objective")?;
        self.post_linear(&objective.expr.clone().minus(&var.into()), 0, 0, &[])?;
        let direction = match objective.sense {
            Sense::Minimize => OptimisationDirection::Minimise,
            Sense::Maximize => OptimisationDirection::Maximise,
        };
        Ok((var, direction))
    }

    fn encode(model: &CpModel) -> Result<(Self, IntVar, OptimisationDirection), Abort> {
        let mut encoder = Self::new(model)?;
        for iv in model.intervals() {
            encoder.post_interval(iv)?;
        }
        for c in model.constraints() {
            let enforcement = c.enforcement.as_slice();
            match &c.kind {
                ConstraintKind::Linear { expr, lb, ub } => {
                    encoder.post_linear(expr, *lb, *ub, enforcement)?
                }
                ConstraintKind::NoOverlap { intervals } => {
                    encoder.post_no_overlap(model, intervals, enforcement)?
                }
                ConstraintKind::MaxEquality { target, exprs } => {
                    encoder.post_max(*target, exprs, enforcement)?
                }
                ConstraintKind::AndEquality { target, literals } => {
                    encoder.post_and(*target, literals, enforcement)?
                }
            }
        }
        let (objective, direction) = encoder.objective(model)?;
        Ok((encoder, objective, direction))
    }
}

impl Solver for PumpkinSolver {
    fn solve(&self, model: &CpModel, params: &SolverParams) -> CpSolution {
        if let Err(reason) = model.validate() {
            warn!(model = model.name(), %reason, "invalid model");
            return CpSolution::empty(SolveStatus::ModelInvalid);
        }

        let started = Instant::now();
        let (mut encoder, objective, direction) = match Encoder::encode(model) {
            Ok(encoded) => encoded,
            Err(Abort::Infeasible) => {
                debug!(model = model.name(), "infeasible at the root");
                return CpSolution::empty(SolveStatus::Infeasible);
            }
            Err(Abort::Overflow(reason)) => {
                warn!(model = model.name(), %reason, "model does not fit the engine");
                return CpSolution::empty(SolveStatus::ModelInvalid);
            }
        };
        debug!(
            model = model.name(),
            engine_vars = encoder.vars.len(),
            "model encoded"
        );

        let model_vars = encoder.vars[..model.var_count()].to_vec();
        let objective = encoder.vars[objective.index()];
        let mut brancher = encoder.engine.default_brancher();
        let mut termination = TimeBudget::starting_now(params.max_time());
        let result = encoder.engine.optimise(
            &mut brancher,
            &mut termination,
            LinearSatUnsat::new(direction, objective, on_solution),
        );

        let (status, values) = match result {
            OptimisationResult::Optimal(solution) => {
                (SolveStatus::Optimal, read_values(&solution, &model_vars))
            }
            OptimisationResult::Satisfiable(solution) => {
                (SolveStatus::Feasible, read_values(&solution, &model_vars))
            }
            OptimisationResult::Unsatisfiable => (SolveStatus::Infeasible, Vec::new()),
            OptimisationResult::Unknown => (SolveStatus::Unknown, Vec::new()),
        };
        debug!(
            model = model.name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            %status,
            "search finished"
        );

        if values.is_empty() {
            return CpSolution::empty(status);
        }
        debug_assert!(model.is_satisfied_by(&values));
        let objective_value = model.objective().map(|o| o.expr.evaluate(&values));
        CpSolution {
            status,
            values,
            objective_value,
        }
    }
}
