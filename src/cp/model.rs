//! Constraint model: variables, constraints and objective.
//!
//! Variables are arena handles into a [`CpModel`]. Booleans are integer
//! variables with domain `[0, 1]`; a [`Literal`] is a boolean or its
//! negation. Every constraint may be enforced by a conjunction of literals:
//! it only has to hold when all of them are true.

use std::ops::Not;

/// Handle of a bounded integer variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntVar(pub(crate) usize);

impl IntVar {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Handle of a boolean variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoolVar(pub(crate) usize);

impl BoolVar {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }

    /// The underlying integer variable (domain `[0, 1]`).
    pub fn as_int(self) -> IntVar {
        IntVar(self.0)
    }

    /// The positive literal of this variable.
    pub fn literal(self) -> Literal {
        Literal {
            var: self.0,
            negated: false,
        }
    }
}

impl Not for BoolVar {
    type Output = Literal;

    fn not(self) -> Literal {
        !self.literal()
    }
}

impl From<BoolVar> for Literal {
    fn from(var: BoolVar) -> Self {
        var.literal()
    }
}

/// A boolean variable or its negation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Literal {
    var: usize,
    negated: bool,
}

impl Literal {
    /// Index of the underlying variable.
    #[inline]
    pub fn index(self) -> usize {
        self.var
    }

    #[inline]
    pub fn is_negated(self) -> bool {
        self.negated
    }

    /// Truth value of the literal for a 0/1 variable value.
    #[inline]
    pub fn holds(self, value: i64) -> bool {
        (value != 0) != self.negated
    }

    /// The literal as a 0/1 linear expression (`x` or `1 - x`).
    pub fn to_expr(self) -> LinearExpr {
        if self.negated {
            LinearExpr::constant(1).with_term(-1, IntVar(self.var))
        } else {
            LinearExpr::from(IntVar(self.var))
        }
    }
}

impl Not for Literal {
    type Output = Literal;

    fn not(self) -> Literal {
        Literal {
            var: self.var,
            negated: !self.negated,
        }
    }
}

/// Handle of an interval variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntervalVar(pub(crate) usize);

impl IntervalVar {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Closed integer range `[lb, ub]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Domain {
    pub lb: i64,
    pub ub: i64,
}

impl Domain {
    pub fn new(lb: i64, ub: i64) -> Self {
        Self { lb, ub }
    }

    #[inline]
    pub fn is_fixed(&self) -> bool {
        self.lb == self.ub
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lb > self.ub
    }

    #[inline]
    pub fn contains(&self, value: i64) -> bool {
        self.lb <= value && value <= self.ub
    }
}

/// Declared integer variable.
#[derive(Debug, Clone)]
pub struct VarInfo {
    pub name: String,
    pub domain: Domain,
}

/// Declared interval: `start + duration == end` when present.
#[derive(Debug, Clone)]
pub struct IntervalInfo {
    pub name: String,
    pub start: IntVar,
    pub duration: IntVar,
    pub end: IntVar,
    /// Presence literal. `None` = always present.
    pub presence: Option<Literal>,
}

/// `Σ coef·var + constant`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinearExpr {
    pub terms: Vec<(i64, IntVar)>,
    pub constant: i64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constant(value: i64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    /// Sum of variables with unit coefficients.
    pub fn sum(vars: impl IntoIterator<Item = IntVar>) -> Self {
        Self {
            terms: vars.into_iter().map(|v| (1, v)).collect(),
            constant: 0,
        }
    }

    pub fn with_term(mut self, coef: i64, var: IntVar) -> Self {
        self.terms.push((coef, var));
        self
    }

    pub fn add_term(&mut self, coef: i64, var: IntVar) {
        self.terms.push((coef, var));
    }

    /// Adds `scale · other` to this expression.
    pub fn add_scaled(&mut self, scale: i64, other: &LinearExpr) {
        self.terms
            .extend(other.terms.iter().map(|&(c, v)| (scale * c, v)));
        self.constant += scale * other.constant;
    }

    /// `self - other`.
    pub fn minus(mut self, other: &LinearExpr) -> Self {
        self.add_scaled(-1, other);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Value under a full assignment.
    pub fn evaluate(&self, values: &[i64]) -> i64 {
        self.constant
            + self
                .terms
                .iter()
                .map(|&(c, v)| c * values[v.0])
                .sum::<i64>()
    }
}

impl From<IntVar> for LinearExpr {
    fn from(var: IntVar) -> Self {
        Self {
            terms: vec![(1, var)],
            constant: 0,
        }
    }
}

/// Constraint kinds supported by the solver contract.
#[derive(Debug, Clone)]
pub enum ConstraintKind {
    /// `lb <= expr <= ub`.
    Linear { expr: LinearExpr, lb: i64, ub: i64 },
    /// No two present intervals share an instant.
    NoOverlap { intervals: Vec<IntervalVar> },
    /// `target == max(exprs)`.
    MaxEquality { target: IntVar, exprs: Vec<LinearExpr> },
    /// `target <=> AND(literals)`.
    AndEquality { target: Literal, literals: Vec<Literal> },
}

/// A constraint plus its enforcement literals.
#[derive(Debug, Clone)]
pub struct Constraint {
    pub kind: ConstraintKind,
    /// The constraint only has to hold when all of these are true.
    pub enforcement: Vec<Literal>,
}

impl Constraint {
    /// Conditions the constraint on the given literals.
    pub fn only_enforce_if(&mut self, literals: impl IntoIterator<Item = Literal>) -> &mut Self {
        self.enforcement.extend(literals);
        self
    }
}

/// Optimization direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Minimize,
    Maximize,
}

/// Single linear objective.
#[derive(Debug, Clone)]
pub struct Objective {
    pub expr: LinearExpr,
    pub sense: Sense,
}

/// A constraint model handed to a [`Solver`](super::Solver).
///
/// # Example
/// ```
/// use recipe_schedule::cp::{CpModel, LinearExpr};
///
/// let mut model = CpModel::new("demo");
/// let start = model.new_int_var(0, 10, "start");
/// let dur = model.new_constant(3, "dur");
/// let end = model.new_int_var(0, 10, "end");
/// let _iv = model.new_interval_var(start, dur, end, "job");
/// model.minimize(LinearExpr::from(end));
/// assert_eq!(model.interval_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CpModel {
    name: String,
    vars: Vec<VarInfo>,
    intervals: Vec<IntervalInfo>,
    constraints: Vec<Constraint>,
    objective: Option<Objective>,
}

impl CpModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creates an integer variable with domain `[lb, ub]`.
    pub fn new_int_var(&mut self, lb: i64, ub: i64, name: impl Into<String>) -> IntVar {
        self.vars.push(VarInfo {
            name: name.into(),
            domain: Domain::new(lb, ub),
        });
        IntVar(self.vars.len() - 1)
    }

    /// Creates a fixed integer variable.
    pub fn new_constant(&mut self, value: i64, name: impl Into<String>) -> IntVar {
        self.new_int_var(value, value, name)
    }

    pub fn new_bool_var(&mut self, name: impl Into<String>) -> BoolVar {
        BoolVar(self.new_int_var(0, 1, name).0)
    }

    /// Creates an always-present interval.
    pub fn new_interval_var(
        &mut self,
        start: IntVar,
        duration: IntVar,
        end: IntVar,
        name: impl Into<String>,
    ) -> IntervalVar {
        self.push_interval(start, duration, end, None, name.into())
    }

    /// Creates an interval present only when `presence` is true.
    pub fn new_optional_interval_var(
        &mut self,
        start: IntVar,
        duration: IntVar,
        end: IntVar,
        presence: Literal,
        name: impl Into<String>,
    ) -> IntervalVar {
        self.push_interval(start, duration, end, Some(presence), name.into())
    }

    fn push_interval(
        &mut self,
        start: IntVar,
        duration: IntVar,
        end: IntVar,
        presence: Option<Literal>,
        name: String,
    ) -> IntervalVar {
        self.intervals.push(IntervalInfo {
            name,
            start,
            duration,
            end,
            presence,
        });
        IntervalVar(self.intervals.len() - 1)
    }

    fn push(&mut self, kind: ConstraintKind) -> &mut Constraint {
        self.constraints.push(Constraint {
            kind,
            enforcement: Vec::new(),
        });
        let last = self.constraints.len() - 1;
        &mut self.constraints[last]
    }

    /// `lb <= expr <= ub`.
    pub fn add_linear(&mut self, expr: LinearExpr, lb: i64, ub: i64) -> &mut Constraint {
        self.push(ConstraintKind::Linear { expr, lb, ub })
    }

    /// `expr == value`.
    pub fn add_equality(&mut self, expr: LinearExpr, value: i64) -> &mut Constraint {
        self.add_linear(expr, value, value)
    }

    /// `left <= right`.
    pub fn add_less_or_equal(
        &mut self,
        left: impl Into<LinearExpr>,
        right: impl Into<LinearExpr>,
    ) -> &mut Constraint {
        let diff = left.into().minus(&right.into());
        self.add_linear(diff, i64::MIN, 0)
    }

    /// `a => b`.
    pub fn add_implication(&mut self, a: Literal, b: Literal) -> &mut Constraint {
        let c = self.add_linear(b.to_expr(), 1, 1);
        c.only_enforce_if([a]);
        c
    }

    pub fn add_no_overlap(&mut self, intervals: Vec<IntervalVar>) -> &mut Constraint {
        self.push(ConstraintKind::NoOverlap { intervals })
    }

    /// `target == max(exprs)`.
    pub fn add_max_equality(&mut self, target: IntVar, exprs: Vec<LinearExpr>) -> &mut Constraint {
        self.push(ConstraintKind::MaxEquality { target, exprs })
    }

    /// `target <=> AND(literals)`.
    pub fn add_bool_and_equality(
        &mut self,
        target: Literal,
        literals: Vec<Literal>,
    ) -> &mut Constraint {
        self.push(ConstraintKind::AndEquality { target, literals })
    }

    pub fn minimize(&mut self, expr: LinearExpr) {
        self.objective = Some(Objective {
            expr,
            sense: Sense::Minimize,
        });
    }

    pub fn maximize(&mut self, expr: LinearExpr) {
        self.objective = Some(Objective {
            expr,
            sense: Sense::Maximize,
        });
    }

    pub fn var_count(&self) -> usize {
        self.vars.len()
    }

    pub fn interval_count(&self) -> usize {
        self.intervals.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    pub fn vars(&self) -> &[VarInfo] {
        &self.vars
    }

    pub fn domain(&self, var: IntVar) -> Domain {
        self.vars[var.0].domain
    }

    pub fn interval(&self, interval: IntervalVar) -> &IntervalInfo {
        &self.intervals[interval.0]
    }

    pub fn intervals(&self) -> &[IntervalInfo] {
        &self.intervals
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objective(&self) -> Option<&Objective> {
        self.objective.as_ref()
    }

    /// Exact check of a full assignment (one value per variable).
    ///
    /// Zero-length intervals never take part in a no-overlap conflict.
    pub fn is_satisfied_by(&self, values: &[i64]) -> bool {
        if values.len() != self.vars.len() {
            return false;
        }
        if self
            .vars
            .iter()
            .zip(values)
            .any(|(v, &x)| !v.domain.contains(x))
        {
            return false;
        }
        let holds_all = |lits: &[Literal]| lits.iter().all(|l| l.holds(values[l.var]));
        let present = |p: Option<Literal>| p.map_or(true, |l| l.holds(values[l.var]));

        let links_hold = self.intervals.iter().all(|iv| {
            !present(iv.presence)
                || values[iv.start.0] + values[iv.duration.0] == values[iv.end.0]
        });
        links_hold
            && self.constraints.iter().all(|c| {
                if !holds_all(&c.enforcement) {
                    return true;
                }
                match &c.kind {
                    ConstraintKind::Linear { expr, lb, ub } => {
                        let v = expr.evaluate(values);
                        *lb <= v && v <= *ub
                    }
                    ConstraintKind::NoOverlap { intervals } => {
                        let spans: Vec<(i64, i64)> = intervals
                            .iter()
                            .map(|&iv| self.interval(iv))
                            .filter(|iv| present(iv.presence) && values[iv.duration.0] > 0)
                            .map(|iv| (values[iv.start.0], values[iv.end.0]))
                            .collect();
                        spans.iter().enumerate().all(|(k, a)| {
                            spans[k + 1..].iter().all(|b| !(a.0 < b.1 && b.0 < a.1))
                        })
                    }
                    ConstraintKind::MaxEquality { target, exprs } => {
                        exprs.iter().map(|e| e.evaluate(values)).max() == Some(values[target.0])
                    }
                    ConstraintKind::AndEquality { target, literals } => {
                        target.holds(values[target.var]) == holds_all(literals)
                    }
                }
            })
    }

    /// Structural check: handles in range, non-empty domains, literals over
    /// 0/1 variables. Returns the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        let n = self.vars.len();
        for v in &self.vars {
            if v.domain.is_empty() {
                return Err(format!(
                    "variable '{}' has empty domain [{}, {}]",
                    v.name, v.domain.lb, v.domain.ub
                ));
            }
        }
        let check_var = |var: IntVar| -> Result<(), String> {
            if var.0 < n {
                Ok(())
            } else {
                Err(format!("variable index {} out of range", var.0))
            }
        };
        let check_lit = |lit: Literal| -> Result<(), String> {
            check_var(IntVar(lit.var))?;
            let d = self.vars[lit.var].domain;
            if d.lb < 0 || d.ub > 1 {
                return Err(format!("literal over non-boolean '{}'", self.vars[lit.var].name));
            }
            Ok(())
        };
        let check_expr = |expr: &LinearExpr| -> Result<(), String> {
            expr.terms.iter().try_for_each(|&(_, v)| check_var(v))
        };

        for iv in &self.intervals {
            check_var(iv.start)?;
            check_var(iv.duration)?;
            check_var(iv.end)?;
            if let Some(p) = iv.presence {
                check_lit(p)?;
            }
        }
        for c in &self.constraints {
            c.enforcement.iter().try_for_each(|&l| check_lit(l))?;
            match &c.kind {
                ConstraintKind::Linear { expr, .. } => check_expr(expr)?,
                ConstraintKind::NoOverlap { intervals } => {
                    if let Some(iv) = intervals.iter().find(|iv| iv.0 >= self.intervals.len()) {
                        return Err(format!("interval index {} out of range", iv.0));
                    }
                }
                ConstraintKind::MaxEquality { target, exprs } => {
                    check_var(*target)?;
                    if exprs.is_empty() {
                        return Err("max equality over no expression".into());
                    }
                    exprs.iter().try_for_each(|e| check_expr(e))?;
                }
                ConstraintKind::AndEquality { target, literals } => {
                    check_lit(*target)?;
                    literals.iter().try_for_each(|&l| check_lit(l))?;
                }
            }
        }
        if let Some(obj) = &self.objective {
            check_expr(&obj.expr)?;
        }
        Ok(())
    }
}
