//! Program (schedule) model.
//!
//! A program is the output schedule: a window plus plans. Every plan
//! assigns one resource to one interval and links it to exactly one
//! origin, either a process step of an order or a stop.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::Resource;

/// A schedule of plans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Unique program code.
    pub code: String,
    /// Window start (earliest plan start after `reset_interval`).
    pub start_at: DateTime<Utc>,
    /// Window end (latest plan end after `reset_interval`).
    pub end_at: DateTime<Utc>,
    /// Resource/time assignments.
    pub plans: Vec<Plan>,
}

/// A resource/time assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// Assigned resource.
    pub resource: Resource,
    /// Absolute start.
    pub start_at: DateTime<Utc>,
    /// Absolute end.
    pub end_at: DateTime<Utc>,
    /// Origin of the plan.
    pub link: PlanLink,
}

/// What a plan was created for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PlanLink {
    /// A process step of an order produced by a recipe.
    Process(ProcessLink),
    /// A resource stoppage.
    Stop { stop: String, reason: String },
}

/// Link of a plan to the process step that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessLink {
    pub process: String,
    pub order: String,
    pub recipe: String,
    pub material: String,
}

impl ProcessLink {
    pub fn new(
        process: impl Into<String>,
        order: impl Into<String>,
        recipe: impl Into<String>,
        material: impl Into<String>,
    ) -> Self {
        Self {
            process: process.into(),
            order: order.into(),
            recipe: recipe.into(),
            material: material.into(),
        }
    }
}

impl Plan {
    pub fn new(
        resource: Resource,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
        link: PlanLink,
    ) -> Self {
        Self {
            resource,
            start_at,
            end_at,
            link,
        }
    }

    /// Creates a plan for a process step.
    pub fn process(
        resource: Resource,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
        link: ProcessLink,
    ) -> Self {
        Self::new(resource, start_at, end_at, PlanLink::Process(link))
    }

    /// Creates a plan for a stop.
    pub fn stop(
        resource: Resource,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
        stop: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::new(
            resource,
            start_at,
            end_at,
            PlanLink::Stop {
                stop: stop.into(),
                reason: reason.into(),
            },
        )
    }

    /// Length of the plan.
    #[inline]
    pub fn duration(&self) -> Duration {
        self.end_at - self.start_at
    }

    /// Whether the plan blocks a resource for a stop.
    pub fn is_stop(&self) -> bool {
        matches!(self.link, PlanLink::Stop { .. })
    }

    /// The process link, if this is a process plan.
    pub fn process_link(&self) -> Option<&ProcessLink> {
        match &self.link {
            PlanLink::Process(link) => Some(link),
            PlanLink::Stop { .. } => None,
        }
    }

    /// Whether two plans share some instant. Touching plans do not overlap.
    pub fn overlaps(&self, other: &Plan) -> bool {
        other.start_at < self.end_at && self.start_at < other.end_at
    }

    /// Moves the plan to start at `start_at`, keeping its duration.
    pub fn move_to(&mut self, start_at: DateTime<Utc>) {
        let duration = self.duration();
        self.start_at = start_at;
        self.end_at = start_at + duration;
    }
}

impl Program {
    /// Creates an empty program.
    pub fn new(code: impl Into<String>, start_at: DateTime<Utc>, end_at: DateTime<Utc>) -> Self {
        Self {
            code: code.into(),
            start_at,
            end_at,
            plans: Vec::new(),
        }
    }

    /// Adds a plan.
    pub fn add_plan(&mut self, plan: Plan) {
        self.plans.push(plan);
    }

    pub fn with_plan(mut self, plan: Plan) -> Self {
        self.add_plan(plan);
        self
    }

    /// Recomputes the window from the plans. No-op on an empty program.
    pub fn reset_interval(&mut self) {
        let start = self.plans.iter().map(|p| p.start_at).min();
        let end = self.plans.iter().map(|p| p.end_at).max();
        if let (Some(start), Some(end)) = (start, end) {
            self.start_at = start;
            self.end_at = end;
        }
    }

    /// Returns all plans assigned to a resource.
    pub fn plans_for_resource(&self, resource_code: &str) -> Vec<&Plan> {
        self.plans
            .iter()
            .filter(|p| p.resource.code == resource_code)
            .collect()
    }

    /// Returns all process plans of an order.
    pub fn plans_for_order(&self, order_code: &str) -> Vec<&Plan> {
        self.plans
            .iter()
            .filter(|p| p.process_link().is_some_and(|l| l.order == order_code))
            .collect()
    }

    /// Plan indices grouped by resource code, each group sorted by start.
    pub fn indices_by_resource(&self) -> HashMap<String, Vec<usize>> {
        let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, plan) in self.plans.iter().enumerate() {
            groups.entry(plan.resource.code.clone()).or_default().push(idx);
        }
        for indices in groups.values_mut() {
            indices.sort_by_key(|&i| (self.plans[i].start_at, i));
        }
        groups
    }

    /// Overlapping adjacent pairs (by start time) on every resource.
    ///
    /// Zero-length plans never conflict and are skipped. Among the rest,
    /// sorted by start, any overlap implies an overlap of an adjacent pair.
    pub fn overlapping_pairs(&self) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for indices in self.indices_by_resource().values() {
            let timed: Vec<usize> = indices
                .iter()
                .copied()
                .filter(|&i| self.plans[i].start_at < self.plans[i].end_at)
                .collect();
            for w in timed.windows(2) {
                let (a, b) = (w[0], w[1]);
                if self.plans[a].overlaps(&self.plans[b]) {
                    pairs.push((a, b));
                }
            }
        }
        pairs
    }

    /// Whether no two plans on the same resource overlap.
    pub fn is_overlap_free(&self) -> bool {
        self.overlapping_pairs().is_empty()
    }

    /// Number of plans.
    pub fn plan_count(&self) -> usize {
        self.plans.len()
    }
}

/// Merges overlapping plans into one plan per connected block.
///
/// Plans are sorted by start; a plan intersecting the current block extends
/// it to `max(end)`. The first plan of each block keeps its link. Intended
/// for plans of a single resource.
pub fn squash_intervals(mut plans: Vec<Plan>) -> Vec<Plan> {
    plans.sort_by_key(|p| p.start_at);
    let mut merged: Vec<Plan> = Vec::with_capacity(plans.len());
    for plan in plans {
        match merged.last_mut() {
            Some(last) if last.overlaps(&plan) => {
                if plan.end_at > last.end_at {
                    last.end_at = plan.end_at;
                }
            }
            _ => merged.push(plan),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(h: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(h)
    }

    fn link(process: &str, order: &str) -> ProcessLink {
        ProcessLink::new(process, order, "RCP", "beer")
    }

    fn sample_program() -> Program {
        Program::new("P1", t(0), t(0))
            .with_plan(Plan::process(Resource::processor("M1"), t(0), t(5), link("A", "O1")))
            .with_plan(Plan::process(Resource::processor("M2"), t(1), t(4), link("B", "O1")))
            .with_plan(Plan::process(Resource::processor("M1"), t(5), t(8), link("A", "O2")))
    }

    #[test]
    fn test_plan_overlap() {
        let r = Resource::processor("M1");
        let a = Plan::stop(r.clone(), t(0), t(2), "S1", "maintenance");
        let b = Plan::stop(r.clone(), t(1), t(3), "S2", "maintenance");
        let c = Plan::stop(r, t(2), t(4), "S3", "maintenance");
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c)); // touching
    }

    #[test]
    fn test_move_to_keeps_duration() {
        let mut p = Plan::process(Resource::processor("M1"), t(1), t(4), link("A", "O1"));
        p.move_to(t(10));
        assert_eq!(p.start_at, t(10));
        assert_eq!(p.end_at, t(13));
    }

    #[test]
    fn test_reset_interval() {
        let mut program = sample_program();
        program.reset_interval();
        assert_eq!(program.start_at, t(0));
        assert_eq!(program.end_at, t(8));

        let mut empty = Program::new("E", t(3), t(4));
        empty.reset_interval();
        assert_eq!(empty.start_at, t(3));
    }

    #[test]
    fn test_queries() {
        let program = sample_program();
        assert_eq!(program.plans_for_resource("M1").len(), 2);
        assert_eq!(program.plans_for_order("O1").len(), 2);
        assert_eq!(program.plan_count(), 3);
        assert!(program.is_overlap_free());
    }

    #[test]
    fn test_overlapping_pairs() {
        let program = sample_program().with_plan(Plan::process(
            Resource::processor("M1"),
            t(7),
            t(9),
            link("A", "O3"),
        ));
        let pairs = program.overlapping_pairs();
        assert_eq!(pairs, vec![(2, 3)]);
        assert!(!program.is_overlap_free());
    }

    #[test]
    fn test_squash_intervals() {
        let r = Resource::processor("M1");
        let plans = vec![
            Plan::stop(r.clone(), t(5), t(6), "S3", "x"),
            Plan::stop(r.clone(), t(0), t(4), "S1", "x"),
            Plan::stop(r.clone(), t(1), t(2), "S2", "x"), // nested in S1
            Plan::stop(r, t(3), t(5), "S4", "x"),
        ];
        let merged = squash_intervals(plans);
        // S1 ∪ S2 ∪ S4 = [0,5]; S3 touches at 5 and stays separate
        assert_eq!(merged.len(), 2);
        assert_eq!((merged[0].start_at, merged[0].end_at), (t(0), t(5)));
        assert_eq!((merged[1].start_at, merged[1].end_at), (t(5), t(6)));
    }

    #[test]
    fn test_plan_link_serde() {
        let p = Plan::stop(Resource::processor("M1"), t(0), t(1), "S1", "cleaning");
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["link"]["kind"], "stop");
        let back: Plan = serde_json::from_value(json).unwrap();
        assert_eq!(back, p);
    }
}
