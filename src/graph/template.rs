//! Recipe graph templates.
//!
//! A [`RecipeTemplate`] is the pruned dependency DAG of one recipe. It is
//! built once when the recipe is registered and then shared read-only by
//! every per-order instance; instances keep their own per-node state in
//! arrays indexed like [`RecipeTemplate::nodes`].

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use super::Dag;
use crate::error::GraphError;
use crate::models::{Material, Process, Recipe};

/// Pruned process DAG of a recipe.
#[derive(Debug, Clone)]
pub struct RecipeTemplate {
    code: String,
    name: String,
    materials: Vec<Material>,
    nodes: Vec<Process>,
    index: HashMap<String, usize>,
    dag: Dag,
    order: Vec<usize>,
    locked: bool,
}

impl RecipeTemplate {
    /// Builds the template: one node per process, edges from successor and
    /// predecessor links, transitively redundant edges removed.
    ///
    /// # Errors
    /// - [`GraphError::DuplicateProcess`] when two processes share a code
    /// - [`GraphError::UnknownProcess`] when a link names no process of the recipe
    /// - [`GraphError::Cycle`] when the links are not acyclic
    pub fn build(recipe: &Recipe, locked: bool) -> Result<Self, GraphError> {
        let mut index = HashMap::with_capacity(recipe.processes.len());
        for (i, process) in recipe.processes.iter().enumerate() {
            if index.insert(process.code.clone(), i).is_some() {
                return Err(GraphError::DuplicateProcess {
                    recipe: recipe.code.clone(),
                    process: process.code.clone(),
                });
            }
        }

        let lookup = |code: &str| {
            index.get(code).copied().ok_or_else(|| GraphError::UnknownProcess {
                recipe: recipe.code.clone(),
                process: code.to_string(),
            })
        };

        let mut dag = Dag::new(recipe.processes.len());
        for (u, process) in recipe.processes.iter().enumerate() {
            for next in &process.successors {
                let v = lookup(next)?;
                dag.add_edge(u, v);
            }
            for prev in &process.predecessors {
                let p = lookup(prev)?;
                dag.add_edge(p, u);
            }
        }

        let cycle = || GraphError::Cycle {
            recipe: recipe.code.clone(),
        };
        let removed = dag.prune().ok_or_else(cycle)?;
        let order = dag.topological_order().ok_or_else(cycle)?;

        debug!(
            recipe = %recipe.code,
            nodes = recipe.processes.len(),
            edges = dag.edge_count(),
            removed,
            "recipe template built"
        );

        Ok(Self {
            code: recipe.code.clone(),
            name: recipe.name.clone(),
            materials: recipe.materials.clone(),
            nodes: recipe.processes.clone(),
            index,
            dag,
            order,
            locked,
        })
    }

    /// Recipe code.
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Materials produced by the recipe.
    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    /// Whether instances of this template carry transition intervals.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Processes, indexed by node.
    pub fn nodes(&self) -> &[Process] {
        &self.nodes
    }

    pub fn node(&self, idx: usize) -> &Process {
        &self.nodes[idx]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Node index of a process code.
    pub fn node_index(&self, process_code: &str) -> Option<usize> {
        self.index.get(process_code).copied()
    }

    /// Dependency edges `(pred, succ)`, sorted.
    pub fn edges(&self) -> Vec<(usize, usize)> {
        self.dag.edges()
    }

    pub fn edge_count(&self) -> usize {
        self.dag.edge_count()
    }

    pub fn dag(&self) -> &Dag {
        &self.dag
    }

    /// Node indices in topological order.
    pub fn topological_order(&self) -> &[usize] {
        &self.order
    }

    pub fn predecessors(&self, idx: usize) -> &[usize] {
        self.dag.predecessors(idx)
    }

    pub fn successors(&self, idx: usize) -> &[usize] {
        self.dag.successors(idx)
    }

    pub fn has_path(&self, from: usize, to: usize) -> bool {
        self.dag.has_path(from, to)
    }

    /// Re-runs the redundant-edge pass. Always 0 on a built template.
    pub fn prune(&mut self) -> usize {
        // acyclicity was established by `build`
        self.dag.prune().unwrap_or(0)
    }

    /// Optional-group tag -> member node indices.
    pub fn optional_groups(&self) -> BTreeMap<&str, Vec<usize>> {
        let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (i, process) in self.nodes.iter().enumerate() {
            if let Some(group) = process.optional_group.as_deref() {
                groups.entry(group).or_default().push(i);
            }
        }
        groups
    }

    /// Edges whose endpoints share at least one resource.
    pub fn resource_sharing_edges(&self) -> Vec<(usize, usize)> {
        self.edges()
            .into_iter()
            .filter(|&(u, v)| self.nodes[u].shares_resource(&self.nodes[v]))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Resource;

    fn chain_recipe() -> Recipe {
        // A -> B -> C plus redundant A -> C (declared as C's predecessor)
        Recipe::new("R1")
            .with_material(Material::new("beer"))
            .with_process(
                Process::new("A", "f")
                    .with_resource(Resource::processor("M1"))
                    .with_successor("B"),
            )
            .with_process(
                Process::new("B", "f")
                    .with_resource(Resource::processor("M1"))
                    .with_successor("C"),
            )
            .with_process(
                Process::new("C", "f")
                    .with_resource(Resource::processor("M2"))
                    .with_predecessor("A")
                    .with_predecessor("B"),
            )
    }

    #[test]
    fn test_build_prunes_redundant_edges() {
        let template = RecipeTemplate::build(&chain_recipe(), false).unwrap();
        assert_eq!(template.node_count(), 3);
        // B -> C declared twice (successor and predecessor) collapses, A -> C is removed
        assert_eq!(template.edges(), vec![(0, 1), (1, 2)]);
        assert_eq!(template.topological_order(), &[0, 1, 2]);
        assert!(template.has_path(0, 2));
    }

    #[test]
    fn test_prune_is_idempotent() {
        let mut template = RecipeTemplate::build(&chain_recipe(), true).unwrap();
        let before = template.edges();
        assert_eq!(template.prune(), 0);
        assert_eq!(template.edges(), before);
        assert!(template.is_locked());
    }

    #[test]
    fn test_cycle_rejected() {
        let recipe = Recipe::new("R2")
            .with_process(Process::new("A", "f").with_successor("B"))
            .with_process(Process::new("B", "f").with_successor("A"));
        let err = RecipeTemplate::build(&recipe, false).unwrap_err();
        assert_eq!(
            err,
            GraphError::Cycle {
                recipe: "R2".into()
            }
        );
    }

    #[test]
    fn test_self_link_rejected() {
        let recipe = Recipe::new("R3").with_process(Process::new("A", "f").with_successor("A"));
        assert!(matches!(
            RecipeTemplate::build(&recipe, false),
            Err(GraphError::Cycle { .. })
        ));
    }

    #[test]
    fn test_unknown_link_rejected() {
        let recipe = Recipe::new("R4").with_process(Process::new("A", "f").with_successor("Z"));
        let err = RecipeTemplate::build(&recipe, false).unwrap_err();
        assert!(matches!(err, GraphError::UnknownProcess { ref process, .. } if process == "Z"));
    }

    #[test]
    fn test_duplicate_process_rejected() {
        let recipe = Recipe::new("R5")
            .with_process(Process::new("A", "f"))
            .with_process(Process::new("A", "g"));
        assert!(matches!(
            RecipeTemplate::build(&recipe, false),
            Err(GraphError::DuplicateProcess { .. })
        ));
    }

    #[test]
    fn test_groups_and_sharing_edges() {
        let recipe = Recipe::new("R6")
            .with_process(
                Process::new("MASH", "f")
                    .with_resource(Resource::processor("K1"))
                    .with_successor("FILTER_A")
                    .with_successor("FILTER_B"),
            )
            .with_process(
                Process::new("FILTER_A", "f")
                    .with_resource(Resource::processor("K1"))
                    .with_optional_group("filter"),
            )
            .with_process(
                Process::new("FILTER_B", "f")
                    .with_resource(Resource::processor("F2"))
                    .with_optional_group("filter"),
            );
        let template = RecipeTemplate::build(&recipe, true).unwrap();

        let groups = template.optional_groups();
        assert_eq!(groups.get("filter"), Some(&vec![1, 2]));
        assert_eq!(template.resource_sharing_edges(), vec![(0, 1)]);
        assert_eq!(template.node_index("FILTER_B"), Some(2));
    }
}
