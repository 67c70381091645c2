//! Resolution entry point for one subproject: traversal, mediation,
//! graph assembly, and category propagation.

use bill_core::dependency::{DeclaredDependency, Requester};
use bill_core::subproject::Subproject;

use crate::builder;
use crate::error::ResolveError;
use crate::graph::DependencyGraph;
use crate::mediator;
use crate::repository::DescriptorSource;
use crate::scope;

/// Resolve the full dependency graph of one subproject.
///
/// Path dependencies on sibling subprojects are not repository artifacts
/// and are ignored here; the scheduler orders subprojects separately.
/// Identical inputs produce an identical graph: winning versions, edge
/// sets, and category sets are all deterministic.
pub async fn resolve<S: DescriptorSource>(
    project: &Subproject,
    source: &S,
) -> Result<DependencyGraph, ResolveError> {
    let pins = project.direct_pins();
    let direct: Vec<DeclaredDependency> = project.repository_dependencies().cloned().collect();

    let raw = builder::collect(&direct, &pins, source).await?;
    let winners = mediator::mediate(&raw, &pins)?;

    let mut graph = DependencyGraph::new();
    for edge in &raw.edges {
        let version = winners
            .get(&edge.target)
            .cloned()
            .unwrap_or_else(|| edge.requested.clone());
        let node = graph.add_node(edge.target.clone(), version);
        match &edge.requester {
            Requester::Root => graph.add_root(node, edge.scope),
            Requester::Artifact(parent) => {
                // Traversal records a requester's edge before any of its
                // children, so the parent node always exists by now.
                if let Some(parent_idx) = graph.find(parent) {
                    graph.add_edge(parent_idx, node, edge.scope);
                }
            }
        }
    }

    scope::propagate(&mut graph);
    tracing::debug!("resolved {} artifacts for {}", graph.len(), project.name);
    Ok(graph)
}
