//! Arena-indexed directed graph with DAG utilities.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Directed graph over nodes `0..n`, edges stored as adjacency lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dag {
    succ: Vec<Vec<usize>>,
    pred: Vec<Vec<usize>>,
}

impl Dag {
    /// Creates a graph with `n` nodes and no edges.
    pub fn new(n: usize) -> Self {
        Self {
            succ: vec![Vec::new(); n],
            pred: vec![Vec::new(); n],
        }
    }

    pub fn node_count(&self) -> usize {
        self.succ.len()
    }

    pub fn edge_count(&self) -> usize {
        self.succ.iter().map(Vec::len).sum()
    }

    /// Adds `u -> v`. Returns `false` if the edge already exists.
    pub fn add_edge(&mut self, u: usize, v: usize) -> bool {
        if self.has_edge(u, v) {
            return false;
        }
        self.succ[u].push(v);
        self.pred[v].push(u);
        true
    }

    pub fn remove_edge(&mut self, u: usize, v: usize) -> bool {
        let before = self.succ[u].len();
        self.succ[u].retain(|&x| x != v);
        self.pred[v].retain(|&x| x != u);
        self.succ[u].len() != before
    }

    pub fn has_edge(&self, u: usize, v: usize) -> bool {
        self.succ[u].contains(&v)
    }

    pub fn successors(&self, u: usize) -> &[usize] {
        &self.succ[u]
    }

    pub fn predecessors(&self, v: usize) -> &[usize] {
        &self.pred[v]
    }

    /// All edges, sorted.
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let mut edges: Vec<(usize, usize)> = self
            .succ
            .iter()
            .enumerate()
            .flat_map(|(u, vs)| vs.iter().map(move |&v| (u, v)))
            .collect();
        edges.sort_unstable();
        edges
    }

    /// Kahn's algorithm, smallest index first among ready nodes.
    /// Returns `None` if the graph has a cycle.
    pub fn topological_order(&self) -> Option<Vec<usize>> {
        let n = self.node_count();
        let mut in_degree: Vec<usize> = self.pred.iter().map(Vec::len).collect();
        let mut ready: BinaryHeap<Reverse<usize>> = (0..n)
            .filter(|&v| in_degree[v] == 0)
            .map(Reverse)
            .collect();
        let mut order = Vec::with_capacity(n);

        while let Some(Reverse(u)) = ready.pop() {
            order.push(u);
            for &v in &self.succ[u] {
                in_degree[v] -= 1;
                if in_degree[v] == 0 {
                    ready.push(Reverse(v));
                }
            }
        }

        (order.len() == n).then_some(order)
    }

    /// Nodes reachable from `from` (including itself).
    pub fn reachable_from(&self, from: usize) -> Vec<bool> {
        let mut seen = vec![false; self.node_count()];
        let mut stack = vec![from];
        seen[from] = true;
        while let Some(u) = stack.pop() {
            for &v in &self.succ[u] {
                if !seen[v] {
                    seen[v] = true;
                    stack.push(v);
                }
            }
        }
        seen
    }

    /// Whether a directed path leads from `from` to `to`.
    pub fn has_path(&self, from: usize, to: usize) -> bool {
        self.reachable_from(from)[to]
    }

    /// Removes transitively redundant edges.
    ///
    /// Edge `(u, v)` is redundant when some node `i` strictly between `u`
    /// and `v` in topological order is reachable from `u` and reaches `v`.
    /// Returns the number of removed edges, or `None` if the graph has a
    /// cycle. Running it twice removes nothing the second time.
    ///
    /// # Reference
    /// Aho, Garey & Ullman (1972), "The Transitive Reduction of a Directed Graph"
    pub fn prune(&mut self) -> Option<usize> {
        let order = self.topological_order()?;
        let mut position = vec![0; order.len()];
        for (idx, &node) in order.iter().enumerate() {
            position[node] = idx;
        }
        let reach: Vec<Vec<bool>> = (0..self.node_count())
            .map(|u| self.reachable_from(u))
            .collect();

        let redundant: Vec<(usize, usize)> = self
            .edges()
            .into_iter()
            .filter(|&(u, v)| {
                order[position[u] + 1..position[v]]
                    .iter()
                    .any(|&i| reach[u][i] && reach[i][v])
            })
            .collect();

        for &(u, v) in &redundant {
            self.remove_edge(u, v);
        }
        Some(redundant.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond_with_shortcut() -> Dag {
        // 0 -> 1 -> 3, 0 -> 2 -> 3, plus shortcut 0 -> 3
        let mut g = Dag::new(4);
        g.add_edge(0, 1);
        g.add_edge(0, 2);
        g.add_edge(1, 3);
        g.add_edge(2, 3);
        g.add_edge(0, 3);
        g
    }

    #[test]
    fn test_duplicate_edges_collapse() {
        let mut g = Dag::new(2);
        assert!(g.add_edge(0, 1));
        assert!(!g.add_edge(0, 1));
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn test_topological_order() {
        let g = diamond_with_shortcut();
        assert_eq!(g.topological_order(), Some(vec![0, 1, 2, 3]));

        let mut cyclic = Dag::new(3);
        cyclic.add_edge(0, 1);
        cyclic.add_edge(1, 2);
        cyclic.add_edge(2, 0);
        assert_eq!(cyclic.topological_order(), None);
        assert_eq!(cyclic.prune(), None);
    }

    #[test]
    fn test_paths() {
        let g = diamond_with_shortcut();
        assert!(g.has_path(0, 3));
        assert!(g.has_path(2, 2));
        assert!(!g.has_path(1, 2));
        assert!(!g.has_path(3, 0));
    }

    #[test]
    fn test_prune_removes_shortcut() {
        let mut g = diamond_with_shortcut();
        assert_eq!(g.prune(), Some(1));
        assert!(!g.has_edge(0, 3));
        assert_eq!(g.edge_count(), 4);
        // reachability is preserved
        assert!(g.has_path(0, 3));
    }

    #[test]
    fn test_prune_idempotent() {
        let mut g = Dag::new(5);
        for (u, v) in [(0, 1), (1, 2), (2, 3), (3, 4), (0, 2), (0, 4), (1, 4)] {
            g.add_edge(u, v);
        }
        assert_eq!(g.prune(), Some(3));
        let snapshot = g.clone();
        assert_eq!(g.prune(), Some(0));
        assert_eq!(g, snapshot);
    }
}
