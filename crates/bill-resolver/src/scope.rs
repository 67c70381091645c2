//! Category propagation over the mediated graph.
//!
//! Every direct dependency seeds its node with its declared scope; edges
//! then carry scopes downward until a fixpoint. A node's category set is
//! the union of the categories implied by every effective scope that
//! reaches it, so one compile-rooted chain grants full production
//! visibility even if test-rooted chains also reach the node.

use std::collections::{HashMap, VecDeque};

use bill_core::category::CategorySet;
use bill_core::dependency::DeclaredScope;

use crate::graph::DependencyGraph;

const SCOPES: [DeclaredScope; 5] = [
    DeclaredScope::Compile,
    DeclaredScope::Runtime,
    DeclaredScope::Provided,
    DeclaredScope::Test,
    DeclaredScope::Build,
];

fn bit(scope: DeclaredScope) -> u8 {
    match scope {
        DeclaredScope::Compile => 1 << 0,
        DeclaredScope::Runtime => 1 << 1,
        DeclaredScope::Provided => 1 << 2,
        DeclaredScope::Test => 1 << 3,
        DeclaredScope::Build => 1 << 4,
    }
}

/// Effective scope of an edge given the requester's effective scope.
///
/// Test, build, provided, and runtime requesters dominate their subtrees;
/// a compile requester imposes nothing, so the edge's declared scope
/// passes through. This keeps test/build subtrees out of every
/// production category.
fn propagate_scope(parent: DeclaredScope, declared: DeclaredScope) -> DeclaredScope {
    match parent {
        DeclaredScope::Test => DeclaredScope::Test,
        DeclaredScope::Build => DeclaredScope::Build,
        DeclaredScope::Provided => DeclaredScope::Provided,
        DeclaredScope::Runtime => DeclaredScope::Runtime,
        DeclaredScope::Compile => declared,
    }
}

/// Compute every node's category set, to a fixpoint.
pub(crate) fn propagate(graph: &mut DependencyGraph) {
    let mut effective: HashMap<petgraph::graph::NodeIndex, u8> = HashMap::new();
    let mut queue: VecDeque<petgraph::graph::NodeIndex> = VecDeque::new();

    for (idx, scope) in graph.roots().to_vec() {
        let bits = effective.entry(idx).or_insert(0);
        if *bits & bit(scope) == 0 {
            *bits |= bit(scope);
            queue.push_back(idx);
        }
    }

    while let Some(idx) = queue.pop_front() {
        let parent_bits = effective.get(&idx).copied().unwrap_or(0);
        for (child, declared) in graph.dependencies_of(idx) {
            let mut grew = false;
            for parent_scope in SCOPES {
                if parent_bits & bit(parent_scope) == 0 {
                    continue;
                }
                let scope = propagate_scope(parent_scope, declared);
                let bits = effective.entry(child).or_insert(0);
                if *bits & bit(scope) == 0 {
                    *bits |= bit(scope);
                    grew = true;
                }
            }
            if grew {
                queue.push_back(child);
            }
        }
    }

    for idx in graph.node_indices() {
        let bits = effective.get(&idx).copied().unwrap_or(0);
        let mut categories = CategorySet::EMPTY;
        for scope in SCOPES {
            if bits & bit(scope) != 0 {
                categories = categories.union(scope.categories());
            }
        }
        graph.node_mut(idx).categories = categories;
    }
}
