//! Task dependency graph: the form ordering facts take on their way to
//! BPMN assembly.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::unionfind::UnionFind;
use petgraph::visit::{Dfs, EdgeRef};
use pmtree_core::{Operator, Tree};

/// Directed graph over task labels; an edge `a -> b` means `b` depends on
/// `a`. Tasks keep their insertion order.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    index: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(from, to)` edges.
    pub fn from_edges<I, S>(edges: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        let mut graph = Self::new();
        for (from, to) in edges {
            graph.add_dependency(from, to);
        }
        graph
    }

    /// Add a task if absent and return its index.
    pub fn add_task(&mut self, label: impl Into<String>) -> NodeIndex {
        let label = label.into();
        if let Some(&idx) = self.index.get(&label) {
            return idx;
        }
        let idx = self.graph.add_node(label.clone());
        self.index.insert(label, idx);
        idx
    }

    /// Record that `to` depends on `from`. Parallel edges are not duplicated.
    pub fn add_dependency(&mut self, from: impl Into<String>, to: impl Into<String>) {
        let a = self.add_task(from);
        let b = self.add_task(to);
        self.graph.update_edge(a, b, ());
    }

    pub fn task_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn dependency_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }

    /// Task labels in insertion order.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.graph.node_weights().map(String::as_str)
    }

    /// `(from, to)` pairs in insertion order.
    pub fn edges(&self) -> Vec<(String, String)> {
        self.graph
            .edge_references()
            .map(|e| (self.graph[e.source()].clone(), self.graph[e.target()].clone()))
            .collect()
    }

    /// For every task, the tasks reachable from it by one or more edges.
    /// A task reaches itself only through a cycle.
    pub fn transitive_closure(&self) -> BTreeMap<String, BTreeSet<String>> {
        let mut closure = BTreeMap::new();
        for start in self.graph.node_indices() {
            let mut reached = BTreeSet::new();
            for next in self.graph.neighbors(start) {
                let mut dfs = Dfs::new(&self.graph, next);
                while let Some(nx) = dfs.next(&self.graph) {
                    reached.insert(self.graph[nx].clone());
                }
            }
            closure.insert(self.graph[start].clone(), reached);
        }
        closure
    }

    /// Weakly connected components as independent graphs, ordered by
    /// their first task.
    pub fn groups(&self) -> Vec<DependencyGraph> {
        let mut components = UnionFind::new(self.graph.node_count());
        for edge in self.graph.edge_references() {
            components.union(edge.source().index(), edge.target().index());
        }

        let mut order: Vec<usize> = Vec::new();
        let mut groups: HashMap<usize, DependencyGraph> = HashMap::new();
        for idx in self.graph.node_indices() {
            let rep = components.find(idx.index());
            let group = groups.entry(rep).or_insert_with(|| {
                order.push(rep);
                DependencyGraph::new()
            });
            group.add_task(self.graph[idx].clone());
        }
        for edge in self.graph.edge_references() {
            let rep = components.find(edge.source().index());
            if let Some(group) = groups.get_mut(&rep) {
                group.add_dependency(
                    self.graph[edge.source()].clone(),
                    self.graph[edge.target()].clone(),
                );
            }
        }
        order
            .into_iter()
            .filter_map(|rep| groups.remove(&rep))
            .collect()
    }

    /// One `SEQ(a, b)` per pair in the transitive closure.
    pub fn elementary_constraints(&self) -> Vec<Tree> {
        crate::bridge::expand_closure(&self.transitive_closure())
    }

    /// `SEQ(a, b)` per direct edge only.
    pub fn direct_constraints(&self) -> Vec<Tree> {
        self.edges()
            .into_iter()
            .map(|(a, b)| Tree::constraint(Operator::Seq, a, b))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closure_follows_chains() {
        let graph = DependencyGraph::from_edges([("A", "B"), ("B", "C"), ("A", "D")]);
        let closure = graph.transitive_closure();
        let reach = |k: &str| closure[k].iter().cloned().collect::<Vec<_>>();
        assert_eq!(reach("A"), ["B", "C", "D"]);
        assert_eq!(reach("B"), ["C"]);
        assert!(closure["C"].is_empty());
    }

    #[test]
    fn cycle_reaches_itself() {
        let graph = DependencyGraph::from_edges([("A", "B"), ("B", "A")]);
        assert!(graph.transitive_closure()["A"].contains("A"));
    }

    #[test]
    fn duplicate_edges_collapse() {
        let graph = DependencyGraph::from_edges([("A", "B"), ("A", "B")]);
        assert_eq!(graph.dependency_count(), 1);
        assert_eq!(graph.task_count(), 2);
    }

    #[test]
    fn groups_are_weakly_connected_components() {
        let graph =
            DependencyGraph::from_edges([("A", "B"), ("X", "Y"), ("C", "B"), ("Y", "Z")]);
        let groups = graph.groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].tasks().collect::<Vec<_>>(), ["A", "B", "C"]);
        assert_eq!(groups[1].tasks().collect::<Vec<_>>(), ["X", "Y", "Z"]);
        assert_eq!(groups[0].dependency_count(), 2);
        assert_eq!(groups[1].edges(), [("X".to_string(), "Y".to_string()), ("Y".into(), "Z".into())]);
    }

    #[test]
    fn elementary_constraints_cover_closure() {
        let graph = DependencyGraph::from_edges([("A", "B"), ("B", "C")]);
        let texts: Vec<String> = graph
            .elementary_constraints()
            .iter()
            .map(Tree::to_string)
            .collect();
        assert_eq!(texts, ["SEQ(A,B)", "SEQ(A,C)", "SEQ(B,C)"]);
        assert_eq!(graph.direct_constraints().len(), 2);
    }
}
