//! The inter-subproject dependency DAG.
//!
//! Adjacency comes from path-type declarations. Construction rejects
//! cycles and dangling path dependencies before anything is scheduled;
//! the scheduler consumes the adjacency, the topological order is for
//! display and diagnostics.

use std::collections::{BTreeMap, HashMap, HashSet};

use bill_core::subproject::Subproject;
use miette::Diagnostic;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Topo;
use petgraph::Direction;
use thiserror::Error;

/// Errors that abort topology construction.
#[derive(Debug, Error, Diagnostic)]
pub enum TopologyError {
    /// Path dependencies form a cycle.
    #[error("subproject dependency cycle: {chain}")]
    #[diagnostic(help("remove or invert one of the path dependencies on the chain"))]
    ProjectCycle { chain: String },

    /// A path dependency names no known subproject.
    #[error("subproject {subproject} declares a path dependency on unknown subproject {target}")]
    #[diagnostic(help(
        "path dependencies name sibling subprojects by artifact; check the spelling against the member list"
    ))]
    UnknownPathDependency { subproject: String, target: String },
}

/// The DAG of subprojects. Edges point from a dependency to its
/// dependents; acyclic by construction.
#[derive(Debug)]
pub struct SubprojectGraph {
    graph: DiGraph<Subproject, ()>,
    indices: HashMap<String, NodeIndex>,
}

impl SubprojectGraph {
    /// Build the DAG from path declarations.
    pub fn build(projects: Vec<Subproject>) -> Result<Self, TopologyError> {
        let mut adjacency: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for project in &projects {
            adjacency.insert(&project.name, project.path_dependencies());
        }
        for (name, deps) in &adjacency {
            for dep in deps {
                if !adjacency.contains_key(dep) {
                    return Err(TopologyError::UnknownPathDependency {
                        subproject: name.to_string(),
                        target: dep.to_string(),
                    });
                }
            }
        }
        if let Some(chain) = find_cycle(&adjacency) {
            return Err(TopologyError::ProjectCycle {
                chain: chain.join(" -> "),
            });
        }

        let mut graph = DiGraph::new();
        let mut indices = HashMap::new();
        for project in projects {
            let name = project.name.clone();
            let idx = graph.add_node(project);
            indices.insert(name, idx);
        }
        let mut edges: Vec<(NodeIndex, NodeIndex)> = Vec::new();
        for idx in graph.node_indices() {
            for dep in graph[idx].path_dependencies() {
                if let Some(&dep_idx) = indices.get(dep) {
                    edges.push((dep_idx, idx));
                }
            }
        }
        for (from, to) in edges {
            graph.add_edge(from, to, ());
        }

        Ok(Self { graph, indices })
    }

    /// Subprojects in dependency-first order.
    pub fn topological_order(&self) -> Vec<&Subproject> {
        let mut topo = Topo::new(&self.graph);
        let mut ordered = Vec::new();
        while let Some(idx) = topo.next(&self.graph) {
            ordered.push(&self.graph[idx]);
        }
        ordered
    }

    pub fn get(&self, name: &str) -> Option<&Subproject> {
        self.indices.get(name).map(|&idx| &self.graph[idx])
    }

    /// Names of the subprojects `name` depends on directly.
    pub fn dependencies_of(&self, name: &str) -> Vec<&str> {
        let Some(&idx) = self.indices.get(name) else {
            return Vec::new();
        };
        let mut deps: Vec<&str> = self
            .graph
            .neighbors_directed(idx, Direction::Incoming)
            .map(|n| self.graph[n].name.as_str())
            .collect();
        deps.sort_unstable();
        deps
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// DFS with an explicit path stack; returns the first cycle found as a
/// name chain ending where it started.
fn find_cycle(adjacency: &BTreeMap<&str, Vec<&str>>) -> Option<Vec<String>> {
    fn visit<'a>(
        node: &'a str,
        adjacency: &BTreeMap<&'a str, Vec<&'a str>>,
        path: &mut Vec<&'a str>,
        finished: &mut HashSet<&'a str>,
    ) -> Option<Vec<String>> {
        if finished.contains(node) {
            return None;
        }
        if let Some(pos) = path.iter().position(|n| *n == node) {
            let mut chain: Vec<String> = path[pos..].iter().map(|s| s.to_string()).collect();
            chain.push(node.to_string());
            return Some(chain);
        }
        path.push(node);
        if let Some(deps) = adjacency.get(node) {
            for dep in deps {
                if let Some(chain) = visit(dep, adjacency, path, finished) {
                    return Some(chain);
                }
            }
        }
        path.pop();
        finished.insert(node);
        None
    }

    let mut finished = HashSet::new();
    for start in adjacency.keys() {
        let mut path = Vec::new();
        if let Some(chain) = visit(start, adjacency, &mut path, &mut finished) {
            return Some(chain);
        }
    }
    None
}
