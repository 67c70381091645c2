use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::coordinate::Coordinate;
use crate::dependency::DeclaredDependency;

/// A member project of a multi-project build.
///
/// Immutable once constructed; the scheduler shares subprojects across
/// concurrently running phase tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subproject {
    pub name: String,
    pub dir: PathBuf,
    /// Direct declarations from this subproject's manifest.
    pub dependencies: Vec<DeclaredDependency>,
}

impl Subproject {
    pub fn new(name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
            dependencies: Vec::new(),
        }
    }

    pub fn with_dependencies(mut self, dependencies: Vec<DeclaredDependency>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Direct declarations that resolve against a repository, in
    /// declaration order.
    pub fn repository_dependencies(&self) -> impl Iterator<Item = &DeclaredDependency> {
        self.dependencies.iter().filter(|d| !d.path)
    }

    /// Exact versions pinned by direct declarations.
    ///
    /// A direct pin wins version mediation unconditionally; range tokens
    /// pin nothing (they are rejected during traversal instead).
    pub fn direct_pins(&self) -> BTreeMap<Coordinate, String> {
        self.repository_dependencies()
            .filter_map(|d| {
                d.version
                    .exact()
                    .map(|v| (d.target.clone(), v.to_string()))
            })
            .collect()
    }

    /// Names of sibling subprojects this one depends on via path
    /// declarations. A path dependency names its sibling by artifact.
    pub fn path_dependencies(&self) -> Vec<&str> {
        self.dependencies
            .iter()
            .filter(|d| d.path)
            .map(|d| d.target.artifact.as_str())
            .collect()
    }
}
