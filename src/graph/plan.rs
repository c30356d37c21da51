//! Plan graphs.
//!
//! A [`PlanGraph`] rebuilds the dependency structure of one order from the
//! plans it already has in a program. Nodes are the recipe's process steps
//! that own at least one plan. Steps with no plans (alternatives that were
//! not chosen) are contracted: `u -> v` exists when the recipe has a path
//! from `u` to `v`, then redundant edges are pruned.

use std::collections::BTreeMap;

use super::{Dag, RecipeTemplate};
use crate::error::{GraphError, RepairError};
use crate::models::Plan;

/// One process step of an order and the plans that realize it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanNode {
    /// Process code.
    pub process: String,
    /// Indices into the program's plan list.
    pub plans: Vec<usize>,
}

/// Dependency graph over the plans of one order.
#[derive(Debug, Clone)]
pub struct PlanGraph {
    order: String,
    recipe: String,
    nodes: Vec<PlanNode>,
    dag: Dag,
    topo: Vec<usize>,
}

impl PlanGraph {
    /// Builds the graph of `order` from the given `(index, plan)` pairs.
    ///
    /// Every plan must be a process plan of `template`.
    pub fn build<'a>(
        template: &RecipeTemplate,
        order: &str,
        plans: impl IntoIterator<Item = (usize, &'a Plan)>,
    ) -> Result<Self, RepairError> {
        // template node -> plan indices, in template order
        let mut by_node: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (idx, plan) in plans {
            let Some(link) = plan.process_link() else {
                continue;
            };
            let node = template
                .node_index(&link.process)
                .ok_or_else(|| RepairError::UnknownProcess {
                    order: order.to_string(),
                    recipe: template.code().to_string(),
                    process: link.process.clone(),
                })?;
            by_node.entry(node).or_default().push(idx);
        }

        let template_nodes: Vec<usize> = by_node.keys().copied().collect();
        let nodes: Vec<PlanNode> = by_node
            .into_iter()
            .map(|(node, plans)| PlanNode {
                process: template.node(node).code.clone(),
                plans,
            })
            .collect();

        let mut dag = Dag::new(nodes.len());
        for (a, &u) in template_nodes.iter().enumerate() {
            let reach = template.dag().reachable_from(u);
            for (b, &v) in template_nodes.iter().enumerate() {
                if a != b && reach[v] {
                    dag.add_edge(a, b);
                }
            }
        }
        let cycle = || GraphError::Cycle {
            recipe: template.code().to_string(),
        };
        dag.prune().ok_or_else(cycle)?;
        let topo = dag.topological_order().ok_or_else(cycle)?;

        Ok(Self {
            order: order.to_string(),
            recipe: template.code().to_string(),
            nodes,
            dag,
            topo,
        })
    }

    pub fn order(&self) -> &str {
        &self.order
    }

    pub fn recipe(&self) -> &str {
        &self.recipe
    }

    pub fn nodes(&self) -> &[PlanNode] {
        &self.nodes
    }

    /// Node owning the given plan index.
    pub fn node_of(&self, plan_idx: usize) -> Option<usize> {
        self.nodes.iter().position(|n| n.plans.contains(&plan_idx))
    }

    /// Node indices in topological order.
    pub fn topological_order(&self) -> &[usize] {
        &self.topo
    }

    pub fn predecessors(&self, node: usize) -> &[usize] {
        self.dag.predecessors(node)
    }

    pub fn edges(&self) -> Vec<(usize, usize)> {
        self.dag.edges()
    }
}
