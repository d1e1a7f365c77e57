//! Module dependency graph: resolution, cycle detection, and scheduling.
//!
//! Node storage reuses `petgraph::graph::DiGraph`, the same graph type the
//! teacher's dependency resolver builds over `Package`s — its `NodeIndex`
//! already gives the index-stable, `Vec`-backed storage a module graph
//! needs, so no arena is hand-rolled here. The topological sort and cycle
//! detection are implemented directly rather than via
//! `petgraph::algo::toposort`, because a deterministic insertion-order
//! tie-break and an explicit cycle path are both required and the library
//! routine provides neither.

use std::collections::{HashMap, VecDeque};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::error::OvoError;
use crate::modules::{DependencyKind, ModuleUnit};
use crate::util::interning::InternedString;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// A module dependency graph. Edges point from a provider to its
/// dependents: an edge `a -> b` means unit `a` must be built before `b`.
pub struct ModuleGraph {
    graph: DiGraph<ModuleUnit, ()>,
    by_module_name: HashMap<InternedString, NodeIndex>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        ModuleGraph {
            graph: DiGraph::new(),
            by_module_name: HashMap::new(),
        }
    }

    /// Insert a scanned unit into the graph. Returns the node's stable
    /// index (valid until nodes are removed, which this graph never does).
    pub fn add_unit(&mut self, unit: ModuleUnit) -> NodeIndex {
        let provides = unit.provides;
        let idx = self.graph.add_node(unit);
        if let Some(name) = provides {
            self.by_module_name.insert(name, idx);
        }
        idx
    }

    pub fn node(&self, idx: NodeIndex) -> &ModuleUnit {
        &self.graph[idx]
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Wire up edges from each unit's `import` declarations to the node
    /// providing that module. Header-unit imports are never resolved to an
    /// in-graph node and are skipped entirely, as specified. Standard-library
    /// imports (`is_std`) are skipped the same way: `import std;` has no
    /// in-graph source. Partition imports resolve the same way as ordinary
    /// imports (partitions are interned under their own name by the caller
    /// that builds them).
    pub fn resolve_dependencies(&mut self) -> Result<(), OvoError> {
        let edges: Vec<(NodeIndex, NodeIndex)> = {
            let mut edges = Vec::new();
            for idx in self.graph.node_indices() {
                let unit = &self.graph[idx];
                let unit_name = unit
                    .provides
                    .map(|n| n.as_str().to_string())
                    .unwrap_or_else(|| unit.source.display().to_string());

                for dep in &unit.dependencies {
                    if dep.kind == DependencyKind::ImportHeaderUnit || dep.is_std {
                        continue;
                    }
                    match self.by_module_name.get(&dep.name) {
                        Some(&provider) => edges.push((provider, idx)),
                        None => {
                            return Err(OvoError::UnresolvedModule {
                                name: dep.name.as_str().to_string(),
                                required_by: unit_name,
                            })
                        }
                    }
                }
            }
            edges
        };

        for (from, to) in edges {
            self.graph.add_edge(from, to, ());
        }
        Ok(())
    }

    /// Deterministic Kahn's-algorithm topological sort. Among nodes that
    /// become ready in the same round, the one with the smallest
    /// `NodeIndex` (i.e. earliest insertion order) is scheduled first.
    pub fn topological_sort(&self) -> Result<Vec<NodeIndex>, OvoError> {
        let mut in_degree: HashMap<NodeIndex, usize> = HashMap::new();
        for idx in self.graph.node_indices() {
            in_degree.insert(idx, self.graph.edges_directed(idx, Direction::Incoming).count());
        }

        let mut ready: VecDeque<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|idx| in_degree[idx] == 0)
            .collect();
        let mut ready_sorted: Vec<NodeIndex> = ready.drain(..).collect();
        ready_sorted.sort_by_key(|idx| idx.index());
        let mut queue: VecDeque<NodeIndex> = ready_sorted.into();

        let mut order = Vec::with_capacity(self.graph.node_count());

        while let Some(idx) = queue.pop_front() {
            order.push(idx);

            let mut newly_ready: Vec<NodeIndex> = Vec::new();
            for edge in self.graph.edges_directed(idx, Direction::Outgoing) {
                let target = edge.target();
                let deg = in_degree.get_mut(&target).unwrap();
                *deg -= 1;
                if *deg == 0 {
                    newly_ready.push(target);
                }
            }
            newly_ready.sort_by_key(|i| i.index());

            // Insertion-sort the newly-ready nodes into the queue so the
            // whole queue stays ordered by NodeIndex, giving a fully
            // deterministic tie-break regardless of traversal order.
            for node in newly_ready {
                let pos = queue
                    .iter()
                    .position(|q| q.index() > node.index())
                    .unwrap_or(queue.len());
                queue.insert(pos, node);
            }
        }

        if order.len() != self.graph.node_count() {
            let cycle = self.detect_cycles().unwrap_or_default();
            return Err(OvoError::CyclicDependency { cycle });
        }

        Ok(order)
    }

    /// Three-colour DFS cycle detection, returning the cycle as a sequence
    /// of module/source names if one exists.
    pub fn detect_cycles(&self) -> Option<Vec<String>> {
        let mut color: HashMap<NodeIndex, Color> = self
            .graph
            .node_indices()
            .map(|i| (i, Color::White))
            .collect();
        let mut stack: Vec<NodeIndex> = Vec::new();

        let mut sorted_nodes: Vec<NodeIndex> = self.graph.node_indices().collect();
        sorted_nodes.sort_by_key(|i| i.index());

        for start in sorted_nodes {
            if color[&start] != Color::White {
                continue;
            }
            if let Some(cycle) = self.dfs_visit(start, &mut color, &mut stack) {
                return Some(cycle.into_iter().map(|idx| self.display_name(idx)).collect());
            }
        }
        None
    }

    fn dfs_visit(
        &self,
        node: NodeIndex,
        color: &mut HashMap<NodeIndex, Color>,
        stack: &mut Vec<NodeIndex>,
    ) -> Option<Vec<NodeIndex>> {
        color.insert(node, Color::Gray);
        stack.push(node);

        let mut targets: Vec<NodeIndex> = self
            .graph
            .edges_directed(node, Direction::Outgoing)
            .map(|e| e.target())
            .collect();
        targets.sort_by_key(|i| i.index());

        for target in targets {
            match color[&target] {
                Color::White => {
                    if let Some(cycle) = self.dfs_visit(target, color, stack) {
                        return Some(cycle);
                    }
                }
                Color::Gray => {
                    let start = stack.iter().position(|&n| n == target).unwrap();
                    let mut cycle: Vec<NodeIndex> = stack[start..].to_vec();
                    cycle.push(target);
                    return Some(cycle);
                }
                Color::Black => {}
            }
        }

        stack.pop();
        color.insert(node, Color::Black);
        None
    }

    fn display_name(&self, idx: NodeIndex) -> String {
        let unit = &self.graph[idx];
        unit.provides
            .map(|n| n.as_str().to_string())
            .unwrap_or_else(|| unit.source.display().to_string())
    }
}

impl Default for ModuleGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::{DependencyKind, ModuleDependency};
    use std::path::PathBuf;

    fn unit(path: &str, provides: Option<&str>) -> ModuleUnit {
        let mut u = ModuleUnit::new(PathBuf::from(path));
        u.provides = provides.map(InternedString::new);
        u.is_interface = provides.is_some();
        u
    }

    fn dep(name: &str) -> ModuleDependency {
        ModuleDependency {
            kind: DependencyKind::Import,
            name: InternedString::new(name),
            is_std: false,
        }
    }

    #[test]
    fn test_simple_chain_topo_order() {
        let mut g = ModuleGraph::new();
        let mut app = unit("app.cppm", Some("app"));
        app.dependencies.push(dep("math"));
        let math = unit("math.cppm", Some("math"));

        let math_idx = g.add_unit(math);
        let app_idx = g.add_unit(app);

        g.resolve_dependencies().unwrap();
        let order = g.topological_sort().unwrap();

        assert_eq!(order, vec![math_idx, app_idx]);
    }

    #[test]
    fn test_unresolved_module_errors() {
        let mut g = ModuleGraph::new();
        let mut app = unit("app.cppm", Some("app"));
        app.dependencies.push(dep("missing"));
        g.add_unit(app);

        let err = g.resolve_dependencies().unwrap_err();
        assert!(matches!(err, OvoError::UnresolvedModule { .. }));
    }

    #[test]
    fn test_cyclic_dependency_detected() {
        let mut g = ModuleGraph::new();
        let mut a = unit("a.cppm", Some("a"));
        a.dependencies.push(dep("b"));
        let mut b = unit("b.cppm", Some("b"));
        b.dependencies.push(dep("a"));

        g.add_unit(a);
        g.add_unit(b);
        g.resolve_dependencies().unwrap();

        let err = g.topological_sort().unwrap_err();
        match err {
            OvoError::CyclicDependency { cycle } => {
                assert!(cycle.contains(&"a".to_string()));
                assert!(cycle.contains(&"b".to_string()));
            }
            other => panic!("expected CyclicDependency, got {other:?}"),
        }
    }

    #[test]
    fn test_header_unit_import_not_resolved_as_node() {
        let mut g = ModuleGraph::new();
        let mut app = unit("app.cppm", Some("app"));
        app.dependencies.push(ModuleDependency {
            kind: DependencyKind::ImportHeaderUnit,
            name: InternedString::new("vector"),
            is_std: false,
        });
        g.add_unit(app);

        g.resolve_dependencies().unwrap();
        let order = g.topological_sort().unwrap();
        assert_eq!(order.len(), 1);
    }

    #[test]
    fn test_std_import_not_resolved_as_node() {
        let mut g = ModuleGraph::new();
        let mut app = unit("app.cppm", Some("app"));
        app.dependencies.push(ModuleDependency {
            kind: DependencyKind::Import,
            name: InternedString::new("std"),
            is_std: true,
        });
        g.add_unit(app);

        g.resolve_dependencies().unwrap();
        let order = g.topological_sort().unwrap();
        assert_eq!(order.len(), 1);
    }
}
