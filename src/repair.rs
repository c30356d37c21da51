//! Overlap-repair heuristic.
//!
//! Removes resource overlaps from an existing program by delaying plans,
//! without a solver. Each order's plans are tied together by a
//! [`PlanGraph`] rebuilt from its recipe, so delaying one step also delays
//! the steps that depend on it.
//!
//! # Algorithm
//!
//! Per iteration:
//! 1. Group plans by resource, sort by start, collect overlapping adjacent
//!    pairs. None left: **repaired**.
//! 2. For each pair (earlier, later): delay the later plan's step to start
//!    at `earlier.end + gap`. When the later plan cannot move (a stop or a
//!    frozen plan), delay the earlier one past it instead.
//! 3. Re-propagate the moved order's graph in topological order: a step
//!    starting before its predecessors' end moves to `end + gap`.
//!
//! Plans ending before the pivot are frozen: they never move and pairs of
//! two frozen plans are not conflicts. After the iteration cap a final
//! check decides between repaired and unrepairable; an unrepairable run
//! always spends the whole cap.
//!
//! # Complexity
//! O(k · (n log n + p · g)) for k iterations, n plans, p conflicting pairs
//! and g steps per order graph.
//!
//! # Reference
//! Vieira, Herrmann & Lin (2003), "Rescheduling manufacturing systems: a
//! framework of strategies, policies, and methods" (right-shift repair)

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::catalog::RecipeCatalog;
use crate::config::RepairConfig;
use crate::error::RepairError;
use crate::graph::PlanGraph;
use crate::models::Program;

/// Repair status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RepairStatus {
    #[serde(rename = "UNKNOWN")]
    NotSolved,
    Repairing,
    Repaired,
    Unrepairable,
}

impl RepairStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RepairStatus::NotSolved => "UNKNOWN",
            RepairStatus::Repairing => "REPAIRING",
            RepairStatus::Repaired => "REPAIRED",
            RepairStatus::Unrepairable => "UNREPAIRABLE",
        }
    }
}

impl fmt::Display for RepairStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a repair run.
#[derive(Debug, Clone, PartialEq)]
pub struct RepairOutcome {
    pub status: RepairStatus,
    /// The repaired (or best-effort) program, window recomputed.
    pub program: Program,
    /// Repair passes performed.
    pub iterations: usize,
    /// Plan moves performed, propagation included.
    pub moves: usize,
}

/// Overlap-repair heuristic.
///
/// # Example
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use recipe_schedule::catalog::RecipeCatalog;
/// use recipe_schedule::config::RepairConfig;
/// use recipe_schedule::models::*;
/// use recipe_schedule::repair::{OverlapRepair, RepairStatus};
///
/// let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let mut catalog = RecipeCatalog::new();
/// catalog
///     .add_recipe(
///         &Recipe::new("ALE")
///             .with_material(Material::new("beer"))
///             .with_process(Process::new("BREW", "f").with_resource(Resource::processor("K"))),
///         false,
///     )
///     .unwrap();
///
/// let brew = |order: &str, h: i64| {
///     Plan::process(
///         Resource::processor("K"),
///         t0 + Duration::hours(h),
///         t0 + Duration::hours(h + 2),
///         ProcessLink::new("BREW", order, "ALE", "beer"),
///     )
/// };
/// let program = Program::new("P", t0, t0).with_plan(brew("O1", 0)).with_plan(brew("O2", 1));
///
/// let repair = OverlapRepair::new(RepairConfig::new().with_gap_seconds(0));
/// let outcome = repair.run(&program, &catalog, t0).unwrap();
/// assert_eq!(outcome.status, RepairStatus::Repaired);
/// assert_eq!(outcome.program.plans[1].start_at, t0 + Duration::hours(2));
/// ```
#[derive(Debug, Clone, Default)]
pub struct OverlapRepair {
    config: RepairConfig,
}

impl OverlapRepair {
    pub fn new(config: RepairConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RepairConfig {
        &self.config
    }

    /// Repairs a copy of `program`.
    ///
    /// # Errors
    /// - [`RepairError::MixedRecipes`] when an order's plans name several recipes
    /// - [`RepairError::Catalog`] when a named recipe is not in `catalog`
    /// - [`RepairError::UnknownProcess`] when a plan names a process its recipe lacks
    #[instrument(skip_all, fields(program = %program.code, plans = program.plan_count()))]
    pub fn run(
        &self,
        program: &Program,
        catalog: &RecipeCatalog,
        pivot: DateTime<Utc>,
    ) -> Result<RepairOutcome, RepairError> {
        let mut ws = Workspace::new(program.clone(), catalog, pivot, self.config.gap())?;

        let mut iterations = 0;
        while iterations < self.config.max_iterations {
            let conflicts = ws.conflicts();
            if conflicts.is_empty() {
                break;
            }
            iterations += 1;
            debug!(iteration = iterations, conflicts = conflicts.len(), "repair pass");

            let before = ws.moves;
            for (a, b) in conflicts {
                ws.resolve(a, b);
            }
            if ws.moves == before {
                debug!(iteration = iterations, "pass moved nothing");
            }
        }

        let remaining = ws.conflicts().len();
        let status = if remaining == 0 {
            RepairStatus::Repaired
        } else {
            RepairStatus::Unrepairable
        };
        info!(%status, iterations, moves = ws.moves, remaining, "repair finished");

        let mut program = ws.program;
        program.reset_interval();
        Ok(RepairOutcome {
            status,
            program,
            iterations,
            moves: ws.moves,
        })
    }
}

/// Mutable repair state over a program copy.
struct Workspace {
    program: Program,
    graphs: Vec<PlanGraph>,
    /// Plan index -> (graph, node); `None` for stops.
    owner: Vec<Option<(usize, usize)>>,
    frozen: Vec<bool>,
    gap: Duration,
    moves: usize,
}

impl Workspace {
    fn new(
        program: Program,
        catalog: &RecipeCatalog,
        pivot: DateTime<Utc>,
        gap: Duration,
    ) -> Result<Self, RepairError> {
        let mut by_order: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (idx, plan) in program.plans.iter().enumerate() {
            if let Some(link) = plan.process_link() {
                by_order.entry(link.order.as_str()).or_default().push(idx);
            }
        }

        let mut graphs = Vec::with_capacity(by_order.len());
        let mut owner = vec![None; program.plans.len()];
        for (order, indices) in by_order {
            let links: Vec<_> = indices
                .iter()
                .filter_map(|&i| program.plans[i].process_link())
                .collect();
            let first = links[0];
            if links.iter().any(|l| l.recipe != first.recipe) {
                return Err(RepairError::MixedRecipes {
                    order: order.to_string(),
                });
            }
            let template = catalog.get(&first.material, &first.recipe)?;
            let graph = PlanGraph::build(
                template,
                order,
                indices.iter().map(|&i| (i, &program.plans[i])),
            )?;

            let g = graphs.len();
            for (node, plan_node) in graph.nodes().iter().enumerate() {
                for &i in &plan_node.plans {
                    owner[i] = Some((g, node));
                }
            }
            graphs.push(graph);
        }

        let frozen = program.plans.iter().map(|p| p.end_at < pivot).collect();
        debug!(orders = graphs.len(), "plan graphs built");
        Ok(Self {
            program,
            graphs,
            owner,
            frozen,
            gap,
            moves: 0,
        })
    }

    /// Overlapping adjacent pairs, earlier plan first, in time order.
    fn conflicts(&self) -> Vec<(usize, usize)> {
        let plans = &self.program.plans;
        let mut pairs: Vec<(usize, usize)> = self
            .program
            .overlapping_pairs()
            .into_iter()
            .filter(|&(a, b)| !(self.frozen[a] && self.frozen[b]))
            .collect();
        pairs.sort_by_key(|&(a, b)| (plans[a].start_at, a, b));
        pairs
    }

    fn movable(&self, idx: usize) -> bool {
        !self.frozen[idx] && self.owner[idx].is_some()
    }

    /// Resolves one pair, re-checking it against current times.
    fn resolve(&mut self, a: usize, b: usize) {
        let plans = &self.program.plans;
        if !plans[a].overlaps(&plans[b]) {
            return;
        }
        let (first, second) = if (plans[b].start_at, b) < (plans[a].start_at, a) {
            (b, a)
        } else {
            (a, b)
        };

        if self.movable(second) {
            let to = self.program.plans[first].end_at + self.gap;
            self.delay(second, to);
        } else if self.movable(first) {
            let to = self.program.plans[second].end_at + self.gap;
            self.delay(first, to);
        } else {
            debug!(first, second, "pair cannot be repaired");
        }
    }

    /// Delays the step owning `idx` so that `idx` starts at `to`, then
    /// re-propagates the order.
    fn delay(&mut self, idx: usize, to: DateTime<Utc>) {
        let Some((g, node)) = self.owner[idx] else {
            return;
        };
        let delta = to - self.program.plans[idx].start_at;
        if delta <= Duration::zero() {
            return;
        }
        self.shift(g, node, delta);
        self.propagate(g);
    }

    fn shift(&mut self, g: usize, node: usize, delta: Duration) {
        for &i in &self.graphs[g].nodes()[node].plans {
            if self.frozen[i] {
                continue;
            }
            let plan = &mut self.program.plans[i];
            plan.move_to(plan.start_at + delta);
            self.moves += 1;
        }
    }

    fn propagate(&mut self, g: usize) {
        let topo = self.graphs[g].topological_order().to_vec();
        for node in topo {
            let Some(pred_end) = self.graphs[g]
                .predecessors(node)
                .iter()
                .filter_map(|&p| self.node_end(g, p))
                .max()
            else {
                continue;
            };
            let Some(start) = self.node_start(g, node) else {
                continue;
            };
            if start < pred_end {
                self.shift(g, node, pred_end + self.gap - start);
            }
        }
    }

    fn node_start(&self, g: usize, node: usize) -> Option<DateTime<Utc>> {
        self.graphs[g].nodes()[node]
            .plans
            .iter()
            .filter(|&&i| !self.frozen[i])
            .map(|&i| self.program.plans[i].start_at)
            .min()
    }

    fn node_end(&self, g: usize, node: usize) -> Option<DateTime<Utc>> {
        self.graphs[g].nodes()[node]
            .plans
            .iter()
            .map(|&i| self.program.plans[i].end_at)
            .max()
    }
}
