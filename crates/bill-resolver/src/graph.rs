//! The mediated dependency graph.
//!
//! Nodes live in a petgraph arena indexed by coordinate; children are
//! node indices, so a node shared by several parents has exactly one
//! identity. The graph is immutable once resolution succeeds and may be
//! read concurrently by later build phases.

use std::collections::{HashMap, HashSet};
use std::fmt;

use bill_core::category::CategorySet;
use bill_core::coordinate::Coordinate;
use bill_core::dependency::DeclaredScope;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

/// A resolved artifact: one live node per coordinate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyNode {
    pub coordinate: Coordinate,
    pub version: String,
    /// Visibility categories, filled in by scope propagation.
    pub categories: CategorySet,
}

impl fmt::Display for DependencyNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.coordinate, self.version)
    }
}

/// A resolved dependency graph for one subproject.
#[derive(Debug)]
pub struct DependencyGraph {
    graph: DiGraph<DependencyNode, DeclaredScope>,
    index: HashMap<Coordinate, NodeIndex>,
    /// Direct dependencies in declaration order, with their declared scopes.
    roots: Vec<(NodeIndex, DeclaredScope)>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
            roots: Vec::new(),
        }
    }

    /// Add a node for a coordinate, or return the existing one.
    ///
    /// The first version registered for a coordinate sticks; mediation
    /// guarantees callers only ever pass the winning version.
    pub fn add_node(&mut self, coordinate: Coordinate, version: String) -> NodeIndex {
        if let Some(&idx) = self.index.get(&coordinate) {
            return idx;
        }
        let idx = self.graph.add_node(DependencyNode {
            coordinate: coordinate.clone(),
            version,
            categories: CategorySet::EMPTY,
        });
        self.index.insert(coordinate, idx);
        idx
    }

    /// Record a direct dependency and the scope it was declared with.
    pub fn add_root(&mut self, idx: NodeIndex, scope: DeclaredScope) {
        if !self.roots.contains(&(idx, scope)) {
            self.roots.push((idx, scope));
        }
    }

    /// Add a dependency edge carrying its declared scope.
    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex, scope: DeclaredScope) {
        let duplicate = self
            .graph
            .edges(from)
            .any(|e| e.target() == to && *e.weight() == scope);
        if !duplicate {
            self.graph.add_edge(from, to, scope);
        }
    }

    pub fn find(&self, coordinate: &Coordinate) -> Option<NodeIndex> {
        self.index.get(coordinate).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> &DependencyNode {
        &self.graph[idx]
    }

    pub(crate) fn node_mut(&mut self, idx: NodeIndex) -> &mut DependencyNode {
        &mut self.graph[idx]
    }

    pub fn roots(&self) -> &[(NodeIndex, DeclaredScope)] {
        &self.roots
    }

    pub(crate) fn node_indices(&self) -> Vec<NodeIndex> {
        self.graph.node_indices().collect()
    }

    /// All resolved nodes, sorted by coordinate.
    pub fn nodes(&self) -> Vec<&DependencyNode> {
        let mut nodes: Vec<&DependencyNode> = self
            .graph
            .node_indices()
            .map(|idx| &self.graph[idx])
            .collect();
        nodes.sort_by(|a, b| a.coordinate.cmp(&b.coordinate));
        nodes
    }

    /// Direct dependencies of a node, with the declared scope of each edge.
    pub fn dependencies_of(&self, idx: NodeIndex) -> Vec<(NodeIndex, DeclaredScope)> {
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.target(), *e.weight()))
            .collect()
    }

    /// Reverse dependencies: who requires this node.
    pub fn dependents_of(&self, idx: NodeIndex) -> Vec<(NodeIndex, DeclaredScope)> {
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| (e.source(), *e.weight()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render the dependency tree, grouping direct dependencies by the
    /// manifest section they came from.
    pub fn render_tree(&self, max_depth: Option<usize>) -> String {
        let mut output = String::new();

        let mut main_roots: Vec<NodeIndex> = Vec::new();
        let mut test_roots: Vec<NodeIndex> = Vec::new();
        let mut build_roots: Vec<NodeIndex> = Vec::new();
        for (idx, scope) in &self.roots {
            match scope {
                DeclaredScope::Test => test_roots.push(*idx),
                DeclaredScope::Build => build_roots.push(*idx),
                _ => main_roots.push(*idx),
            }
        }

        let sections: Vec<(&str, &Vec<NodeIndex>)> = [
            ("[dependencies]", &main_roots),
            ("[dev-dependencies]", &test_roots),
            ("[build-dependencies]", &build_roots),
        ]
        .into_iter()
        .filter(|(_, roots)| !roots.is_empty())
        .collect();

        let show_headers = sections.len() > 1 || !test_roots.is_empty() || !build_roots.is_empty();
        let mut visited = HashSet::new();

        for (section_no, (label, roots)) in sections.iter().enumerate() {
            if show_headers {
                output.push_str(label);
                output.push('\n');
            }
            let is_last_section = section_no == sections.len() - 1;
            for (i, idx) in roots.iter().enumerate() {
                let is_last = i == roots.len() - 1 && is_last_section;
                self.render_subtree(&mut output, *idx, "", is_last, 1, max_depth, &mut visited);
            }
        }

        output
    }

    #[allow(clippy::too_many_arguments)]
    fn render_subtree(
        &self,
        output: &mut String,
        idx: NodeIndex,
        prefix: &str,
        is_last: bool,
        depth: usize,
        max_depth: Option<usize>,
        visited: &mut HashSet<NodeIndex>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        output.push_str(&format!("{prefix}{connector}{}\n", self.graph[idx]));

        if let Some(max) = max_depth {
            if depth >= max {
                return;
            }
        }

        if !visited.insert(idx) {
            return;
        }

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let children = self.dependencies_of(idx);
        for (i, (child, _)) in children.iter().enumerate() {
            let is_last = i == children.len() - 1;
            self.render_subtree(
                output,
                *child,
                &child_prefix,
                is_last,
                depth + 1,
                max_depth,
                visited,
            );
        }

        visited.remove(&idx);
    }

    /// Find a chain from a direct dependency to `target_key`.
    ///
    /// Accepts either `group:artifact` or a bare artifact name.
    pub fn find_path(&self, target_key: &str) -> Option<Vec<&DependencyNode>> {
        let target = self.resolve_key(target_key)?;
        for (root, _) in &self.roots {
            let mut path = Vec::new();
            let mut visited = HashSet::new();
            if self.dfs_path(*root, target, &mut path, &mut visited) {
                return Some(path.iter().map(|&idx| &self.graph[idx]).collect());
            }
        }
        None
    }

    fn resolve_key(&self, key: &str) -> Option<NodeIndex> {
        if let Some(coordinate) = Coordinate::parse(key) {
            if let Some(&idx) = self.index.get(&coordinate) {
                return Some(idx);
            }
        }
        // Fall back to matching by artifact name alone.
        let mut matches: Vec<(&Coordinate, NodeIndex)> = self
            .index
            .iter()
            .filter(|(coordinate, _)| coordinate.artifact == key)
            .map(|(coordinate, &idx)| (coordinate, idx))
            .collect();
        matches.sort_by(|a, b| a.0.cmp(b.0));
        matches.first().map(|(_, idx)| *idx)
    }

    fn dfs_path(
        &self,
        current: NodeIndex,
        target: NodeIndex,
        path: &mut Vec<NodeIndex>,
        visited: &mut HashSet<NodeIndex>,
    ) -> bool {
        path.push(current);
        if current == target {
            return true;
        }
        if !visited.insert(current) {
            path.pop();
            return false;
        }
        for edge in self.graph.edges(current) {
            if self.dfs_path(edge.target(), target, path, visited) {
                return true;
            }
        }
        path.pop();
        false
    }

    /// Render the reverse-dependency tree for one artifact: who pulls it in.
    pub fn render_inverted_tree(&self, target_key: &str) -> String {
        let mut output = String::new();
        let Some(idx) = self.resolve_key(target_key) else {
            return output;
        };

        output.push_str(&format!("{}\n", self.graph[idx]));

        let mut visited = HashSet::new();
        visited.insert(idx);

        let dependents = self.dependents_of(idx);
        for (i, (dep_idx, _)) in dependents.iter().enumerate() {
            let is_last = i == dependents.len() - 1;
            self.render_inverted_subtree(&mut output, *dep_idx, "", is_last, &mut visited);
        }

        output
    }

    fn render_inverted_subtree(
        &self,
        output: &mut String,
        idx: NodeIndex,
        prefix: &str,
        is_last: bool,
        visited: &mut HashSet<NodeIndex>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        output.push_str(&format!("{prefix}{connector}{}\n", self.graph[idx]));

        if !visited.insert(idx) {
            return;
        }

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let dependents = self.dependents_of(idx);
        for (i, (dep_idx, _)) in dependents.iter().enumerate() {
            let is_last = i == dependents.len() - 1;
            self.render_inverted_subtree(output, *dep_idx, &child_prefix, is_last, visited);
        }

        visited.remove(&idx);
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}
