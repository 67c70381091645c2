//! Resolution error taxonomy.
//!
//! Every fatal report names the offending coordinates, carries the
//! requester chain that reached them, and suggests a concrete fix.

use std::fmt;

use bill_core::coordinate::Coordinate;
use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

use crate::repository::FetchError;

/// A requester chain from a root declaration to an offending edge.
///
/// Renders as `bill.toml -> org.a:a:1.0 -> org.b:b:2.0`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DependencyChain(Vec<String>);

impl DependencyChain {
    pub fn new(links: Vec<String>) -> Self {
        Self(links)
    }

    /// A chain starting at the subproject manifest.
    pub fn root() -> Self {
        Self(vec!["bill.toml".to_string()])
    }

    pub fn push(&mut self, link: impl Into<String>) {
        self.0.push(link.into());
    }

    pub fn links(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for DependencyChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" -> "))
    }
}

/// One conflicting version and every chain that requested it.
#[derive(Debug, Clone, Serialize)]
pub struct ConflictingVersion {
    pub version: String,
    pub chains: Vec<DependencyChain>,
}

/// All distinct versions requested for one coordinate, with no direct
/// pin to break the tie.
#[derive(Debug, Clone, Serialize)]
pub struct ConflictReport {
    pub coordinate: Coordinate,
    pub versions: Vec<ConflictingVersion>,
}

impl ConflictReport {
    /// A manifest line that would pin this coordinate and end the
    /// conflict. The highest requested version by plain string comparison
    /// is suggested as a starting point; no version ordering is implied.
    pub fn suggested_pin(&self) -> String {
        let highest = self
            .versions
            .iter()
            .map(|v| v.version.as_str())
            .max()
            .unwrap_or("1.0");
        format!("{}:{}", self.coordinate, highest)
    }
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} distinct versions of {} are requested and no direct declaration pins one:",
            self.versions.len(),
            self.coordinate
        )?;
        for version in &self.versions {
            for chain in &version.chains {
                writeln!(f, "  {} via {}", version.version, chain)?;
            }
        }
        write!(
            f,
            "  suggested pin: add \"{}\" to [dependencies]",
            self.suggested_pin()
        )
    }
}

/// Errors that abort a subproject's resolution.
///
/// None of these downgrade to a best-effort version choice; any variant
/// blocks every build phase of the owning subproject.
#[derive(Debug, Error, Diagnostic)]
pub enum ResolveError {
    /// Multiple distinct versions requested with no direct pin to mediate.
    #[error("{report}")]
    #[diagnostic(help(
        "declare the dependency directly in bill.toml to pin one version; the report lists a suggested line"
    ))]
    Conflict { report: ConflictReport },

    /// A version range token was declared, directly or transitively.
    #[error("version range \"{spec}\" for {coordinate} is not allowed (via {chain})")]
    #[diagnostic(help(
        "ranges make resolution depend on repository state; replace the range with an exact version"
    ))]
    VersionRange {
        coordinate: Coordinate,
        spec: String,
        chain: DependencyChain,
    },

    /// An artifact requires itself through a chain of descriptors.
    #[error("dependency cycle detected: {chain}")]
    #[diagnostic(help(
        "break the cycle by excluding one of the edges or restructuring the artifacts"
    ))]
    ArtifactCycle { chain: DependencyChain },

    /// The repository collaborator could not supply a descriptor.
    #[error("failed to fetch descriptor for {coordinate}:{version} (required via {chain})")]
    #[diagnostic(help(
        "check the coordinate spelling and the repository configuration; transient failures are retried by the repository client, not here"
    ))]
    DescriptorFetch {
        coordinate: Coordinate,
        version: String,
        chain: DependencyChain,
        #[source]
        cause: FetchError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_display() {
        let mut chain = DependencyChain::root();
        chain.push("org.a:a:1.0");
        chain.push("org.b:b:2.0");
        assert_eq!(chain.to_string(), "bill.toml -> org.a:a:1.0 -> org.b:b:2.0");
    }

    #[test]
    fn conflict_report_lists_versions_chains_and_suggestion() {
        let report = ConflictReport {
            coordinate: Coordinate::new("org.slf4j", "slf4j-api"),
            versions: vec![
                ConflictingVersion {
                    version: "1.7.36".into(),
                    chains: vec![DependencyChain::new(vec![
                        "bill.toml".into(),
                        "org.a:a:1.0".into(),
                        "org.slf4j:slf4j-api:1.7.36".into(),
                    ])],
                },
                ConflictingVersion {
                    version: "2.0.9".into(),
                    chains: vec![DependencyChain::new(vec![
                        "bill.toml".into(),
                        "org.b:b:1.0".into(),
                        "org.slf4j:slf4j-api:2.0.9".into(),
                    ])],
                },
            ],
        };
        let text = report.to_string();
        assert!(text.contains("org.slf4j:slf4j-api"));
        assert!(text.contains("1.7.36 via bill.toml -> org.a:a:1.0"));
        assert!(text.contains("2.0.9 via bill.toml -> org.b:b:1.0"));
        assert!(text.contains("suggested pin: add \"org.slf4j:slf4j-api:2.0.9\""));
    }

    #[test]
    fn suggested_pin_is_string_maximum() {
        let report = ConflictReport {
            coordinate: Coordinate::new("org.x", "x"),
            versions: vec![
                ConflictingVersion {
                    version: "1.9".into(),
                    chains: vec![],
                },
                ConflictingVersion {
                    version: "1.10".into(),
                    chains: vec![],
                },
            ],
        };
        // Plain string comparison, deliberately: "1.9" > "1.10".
        assert_eq!(report.suggested_pin(), "org.x:x:1.9");
    }
}
