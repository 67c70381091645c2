//! Raw dependency multigraph construction.
//!
//! Depth-first traversal of transitive descriptors. Each frame on the
//! traversal stack carries the union of exclusion sets inherited from
//! every edge above it; the path of coordinates currently being expanded
//! doubles as the artifact cycle detector. A version range token anywhere
//! in the tree aborts the traversal.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use bill_core::coordinate::Coordinate;
use bill_core::dependency::{DeclaredDependency, DeclaredScope, Requester, VersionSpec};

use crate::error::{DependencyChain, ResolveError};
use crate::repository::DescriptorSource;

/// One discovered declaration instance.
///
/// The same coordinate may appear in several edges at different requested
/// versions; mediation collapses them into one winner or fails.
#[derive(Debug, Clone)]
pub struct RawEdge {
    pub requester: Requester,
    pub target: Coordinate,
    pub requested: String,
    pub scope: DeclaredScope,
    /// Requesters from the manifest down to (and including) the target.
    pub chain: DependencyChain,
}

/// The pre-mediation multigraph, edges in discovery order.
#[derive(Debug, Default)]
pub struct RawGraph {
    pub edges: Vec<RawEdge>,
}

impl RawGraph {
    /// Distinct requested versions per coordinate, deterministically
    /// ordered.
    pub fn requested_versions(&self) -> BTreeMap<&Coordinate, BTreeSet<&str>> {
        let mut out: BTreeMap<&Coordinate, BTreeSet<&str>> = BTreeMap::new();
        for edge in &self.edges {
            out.entry(&edge.target)
                .or_default()
                .insert(edge.requested.as_str());
        }
        out
    }

    /// Every chain that requested `coordinate` at `version`.
    pub fn chains_for(&self, coordinate: &Coordinate, version: &str) -> Vec<DependencyChain> {
        self.edges
            .iter()
            .filter(|e| &e.target == coordinate && e.requested == version)
            .map(|e| e.chain.clone())
            .collect()
    }
}

/// A descriptor currently being walked.
struct Frame {
    /// The coordinate whose declared dependencies remain in `children`;
    /// `None` for the subproject manifest itself.
    owner: Option<Coordinate>,
    children: std::vec::IntoIter<DeclaredDependency>,
    /// Union of exclusion sets from every edge above the children.
    exclusions: BTreeSet<Coordinate>,
    /// Display chain from the manifest to `owner`.
    trail: DependencyChain,
}

/// Traverse declared dependencies into a raw multigraph.
///
/// Each coordinate's descriptor is expanded once, at the direct-pin
/// version when `pins` carries one, otherwise at the first requested
/// version. Every requested version is still recorded as an edge so
/// mediation sees the full picture.
pub async fn collect<S: DescriptorSource>(
    direct: &[DeclaredDependency],
    pins: &BTreeMap<Coordinate, String>,
    source: &S,
) -> Result<RawGraph, ResolveError> {
    let mut graph = RawGraph::default();
    let mut finished: HashSet<Coordinate> = HashSet::new();
    let mut path: Vec<Coordinate> = Vec::new();
    let mut stack: Vec<Frame> = vec![Frame {
        owner: None,
        children: direct
            .iter()
            .filter(|d| !d.path)
            .cloned()
            .collect::<Vec<_>>()
            .into_iter(),
        exclusions: BTreeSet::new(),
        trail: DependencyChain::root(),
    }];

    loop {
        let next = match stack.last_mut() {
            Some(frame) => frame.children.next(),
            None => break,
        };
        let Some(dep) = next else {
            if let Some(frame) = stack.pop() {
                if let Some(owner) = frame.owner {
                    path.pop();
                    finished.insert(owner);
                }
            }
            continue;
        };
        let (trail, exclusions) = match stack.last() {
            Some(frame) => (frame.trail.clone(), frame.exclusions.clone()),
            None => break,
        };

        if exclusions.contains(&dep.target) {
            tracing::debug!("dropping {} (excluded via {})", dep.target, trail);
            continue;
        }

        let requested = match &dep.version {
            VersionSpec::Exact(v) => v.clone(),
            VersionSpec::Range(spec) => {
                let mut chain = trail.clone();
                chain.push(format!("{}:{}", dep.target, spec));
                return Err(ResolveError::VersionRange {
                    coordinate: dep.target.clone(),
                    spec: spec.clone(),
                    chain,
                });
            }
        };

        if let Some(pos) = path.iter().position(|c| *c == dep.target) {
            let mut links: Vec<String> = path[pos..].iter().map(|c| c.to_string()).collect();
            links.push(dep.target.to_string());
            return Err(ResolveError::ArtifactCycle {
                chain: DependencyChain::new(links),
            });
        }

        let mut chain = trail.clone();
        chain.push(format!("{}:{}", dep.target, requested));
        graph.edges.push(RawEdge {
            requester: dep.requester.clone(),
            target: dep.target.clone(),
            requested: requested.clone(),
            scope: dep.scope,
            chain,
        });

        if finished.contains(&dep.target) {
            continue;
        }

        let effective = pins
            .get(&dep.target)
            .cloned()
            .unwrap_or_else(|| requested.clone());

        let descriptor = source
            .fetch_descriptor(&dep.target, &effective)
            .await
            .map_err(|cause| {
                let mut chain = trail.clone();
                chain.push(format!("{}:{}", dep.target, effective));
                ResolveError::DescriptorFetch {
                    coordinate: dep.target.clone(),
                    version: effective.clone(),
                    chain,
                    cause,
                }
            })?;

        let mut child_exclusions = exclusions;
        child_exclusions.extend(dep.exclusions.iter().cloned());

        let children: Vec<DeclaredDependency> = descriptor
            .into_iter()
            .filter(|child| !child.path)
            .filter(|child| {
                // Only direct declarations inject test/provided scopes.
                let kept = !matches!(
                    child.scope,
                    DeclaredScope::Test | DeclaredScope::Provided
                );
                if !kept {
                    tracing::debug!(
                        "skipping {} ({}-scoped declaration of {})",
                        child.target,
                        child.scope,
                        dep.target
                    );
                }
                kept
            })
            .map(|child| DeclaredDependency {
                requester: Requester::Artifact(dep.target.clone()),
                ..child
            })
            .collect();

        let mut child_trail = trail;
        child_trail.push(format!("{}:{}", dep.target, effective));
        path.push(dep.target.clone());
        stack.push(Frame {
            owner: Some(dep.target.clone()),
            children: children.into_iter(),
            exclusions: child_exclusions,
            trail: child_trail,
        });
    }

    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::StaticSource;
    use bill_core::coordinate::VersionedCoordinate;

    fn coord(s: &str) -> Coordinate {
        Coordinate::parse(s).unwrap()
    }

    fn vc(s: &str) -> VersionedCoordinate {
        VersionedCoordinate::parse(s).unwrap()
    }

    fn trans(requester: &str, target: &str, version: &str) -> DeclaredDependency {
        DeclaredDependency::transitive(coord(requester), coord(target), version)
    }

    #[tokio::test]
    async fn records_every_requested_version() {
        let mut source = StaticSource::new();
        source.insert(vc("org.a:a:1.0"), vec![trans("org.a:a", "org.c:c", "1.0")]);
        source.insert(vc("org.b:b:1.0"), vec![trans("org.b:b", "org.c:c", "2.0")]);
        source.insert(vc("org.c:c:1.0"), vec![]);

        let direct = vec![
            DeclaredDependency::direct(coord("org.a:a"), "1.0"),
            DeclaredDependency::direct(coord("org.b:b"), "1.0"),
        ];
        let raw = collect(&direct, &BTreeMap::new(), &source).await.unwrap();

        let versions = raw.requested_versions();
        let c = coord("org.c:c");
        assert_eq!(
            versions.get(&c).unwrap().iter().copied().collect::<Vec<_>>(),
            vec!["1.0", "2.0"]
        );
        // The second request is recorded without re-expanding org.c:c.
        assert_eq!(raw.edges.len(), 4);
    }

    #[tokio::test]
    async fn expands_at_the_direct_pin_version() {
        let mut source = StaticSource::new();
        source.insert(vc("org.a:a:1.0"), vec![trans("org.a:a", "org.c:c", "2.0")]);
        // Only the pinned version of org.c:c is registered; traversal must
        // never ask for 2.0.
        source.insert(vc("org.c:c:1.5"), vec![]);

        let direct = vec![
            DeclaredDependency::direct(coord("org.a:a"), "1.0"),
            DeclaredDependency::direct(coord("org.c:c"), "1.5"),
        ];
        let pins = BTreeMap::from([(coord("org.c:c"), "1.5".to_string())]);
        let raw = collect(&direct, &pins, &source).await.unwrap();
        assert!(raw
            .edges
            .iter()
            .any(|e| e.target == coord("org.c:c") && e.requested == "2.0"));
    }

    #[tokio::test]
    async fn transitive_range_is_fatal() {
        let mut source = StaticSource::new();
        source.insert(
            vc("org.a:a:1.0"),
            vec![trans("org.a:a", "org.c:c", "[1.0,2.0)")],
        );

        let direct = vec![DeclaredDependency::direct(coord("org.a:a"), "1.0")];
        let err = collect(&direct, &BTreeMap::new(), &source)
            .await
            .unwrap_err();
        match err {
            ResolveError::VersionRange {
                coordinate,
                spec,
                chain,
            } => {
                assert_eq!(coordinate, coord("org.c:c"));
                assert_eq!(spec, "[1.0,2.0)");
                assert_eq!(
                    chain.to_string(),
                    "bill.toml -> org.a:a:1.0 -> org.c:c:[1.0,2.0)"
                );
            }
            other => panic!("expected VersionRange, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn artifact_cycle_reports_the_full_chain() {
        let mut source = StaticSource::new();
        source.insert(vc("org.a:a:1.0"), vec![trans("org.a:a", "org.b:b", "1.0")]);
        source.insert(vc("org.b:b:1.0"), vec![trans("org.b:b", "org.a:a", "1.0")]);

        let direct = vec![DeclaredDependency::direct(coord("org.a:a"), "1.0")];
        let err = collect(&direct, &BTreeMap::new(), &source)
            .await
            .unwrap_err();
        match err {
            ResolveError::ArtifactCycle { chain } => {
                assert_eq!(chain.to_string(), "org.a:a -> org.b:b -> org.a:a");
            }
            other => panic!("expected ArtifactCycle, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cycle_below_a_shared_node_is_still_detected() {
        // root -> a -> c -> b and b -> c: the b/c cycle is entered from a
        // path that reaches c first.
        let mut source = StaticSource::new();
        source.insert(vc("org.a:a:1.0"), vec![trans("org.a:a", "org.c:c", "1.0")]);
        source.insert(vc("org.c:c:1.0"), vec![trans("org.c:c", "org.b:b", "1.0")]);
        source.insert(vc("org.b:b:1.0"), vec![trans("org.b:b", "org.c:c", "1.0")]);

        let direct = vec![
            DeclaredDependency::direct(coord("org.a:a"), "1.0"),
            DeclaredDependency::direct(coord("org.b:b"), "1.0"),
        ];
        let err = collect(&direct, &BTreeMap::new(), &source)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::ArtifactCycle { .. }));
    }

    #[tokio::test]
    async fn inherited_exclusions_drop_edges_without_traversal() {
        let mut source = StaticSource::new();
        source.insert(vc("org.a:a:1.0"), vec![trans("org.a:a", "org.b:b", "1.0")]);
        // org.x:x is never registered: if the exclusion failed, the fetch
        // would error with NotFound.
        source.insert(vc("org.b:b:1.0"), vec![trans("org.b:b", "org.x:x", "1.0")]);

        let direct = vec![
            DeclaredDependency::direct(coord("org.a:a"), "1.0").with_exclusion(coord("org.x:x"))
        ];
        let raw = collect(&direct, &BTreeMap::new(), &source).await.unwrap();
        assert!(raw.edges.iter().all(|e| e.target != coord("org.x:x")));
    }

    #[tokio::test]
    async fn transitive_test_scoped_declarations_are_not_traversed() {
        let mut source = StaticSource::new();
        source.insert(
            vc("org.a:a:1.0"),
            vec![
                trans("org.a:a", "org.b:b", "1.0").with_scope(DeclaredScope::Test),
                trans("org.a:a", "org.c:c", "1.0"),
            ],
        );
        source.insert(vc("org.c:c:1.0"), vec![]);

        let direct = vec![DeclaredDependency::direct(coord("org.a:a"), "1.0")];
        let raw = collect(&direct, &BTreeMap::new(), &source).await.unwrap();
        assert!(raw.edges.iter().all(|e| e.target != coord("org.b:b")));
        assert!(raw.edges.iter().any(|e| e.target == coord("org.c:c")));
    }

    #[tokio::test]
    async fn fetch_failure_carries_the_requester_chain() {
        let mut source = StaticSource::new();
        source.insert(vc("org.a:a:1.0"), vec![trans("org.a:a", "org.b:b", "9.9")]);

        let direct = vec![DeclaredDependency::direct(coord("org.a:a"), "1.0")];
        let err = collect(&direct, &BTreeMap::new(), &source)
            .await
            .unwrap_err();
        match err {
            ResolveError::DescriptorFetch {
                coordinate,
                version,
                chain,
                cause,
            } => {
                assert_eq!(coordinate, coord("org.b:b"));
                assert_eq!(version, "9.9");
                assert_eq!(cause, crate::repository::FetchError::NotFound);
                assert_eq!(
                    chain.to_string(),
                    "bill.toml -> org.a:a:1.0 -> org.b:b:9.9"
                );
            }
            other => panic!("expected DescriptorFetch, got {other:?}"),
        }
    }
}
