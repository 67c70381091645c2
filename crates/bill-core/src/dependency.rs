use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::category::{Category, CategorySet};
use crate::coordinate::Coordinate;

/// Declared dependency scope, as written in a bill.toml or a fetched
/// descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclaredScope {
    Compile,
    Runtime,
    Provided,
    Test,
    Build,
}

impl Default for DeclaredScope {
    fn default() -> Self {
        Self::Compile
    }
}

impl DeclaredScope {
    /// Visibility categories a dependency declared with this scope receives.
    ///
    /// `provided` is on the compile and test classpaths but never packaged
    /// or carried to runtime; `build` stays off every production classpath.
    pub fn categories(self) -> CategorySet {
        match self {
            DeclaredScope::Compile => CategorySet::of(&[
                Category::Compile,
                Category::Package,
                Category::Runtime,
                Category::Test,
            ]),
            DeclaredScope::Runtime => {
                CategorySet::of(&[Category::Package, Category::Runtime, Category::Test])
            }
            DeclaredScope::Provided => CategorySet::of(&[Category::Compile, Category::Test]),
            DeclaredScope::Test => CategorySet::of(&[Category::Test]),
            DeclaredScope::Build => CategorySet::of(&[Category::Build]),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DeclaredScope::Compile => "compile",
            DeclaredScope::Runtime => "runtime",
            DeclaredScope::Provided => "provided",
            DeclaredScope::Test => "test",
            DeclaredScope::Build => "build",
        }
    }
}

impl fmt::Display for DeclaredScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Version requested by a declaration: an exact pin or a range token.
///
/// Range tokens are recorded so diagnostics can quote them, but they are
/// categorically rejected during resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VersionSpec {
    Exact(String),
    Range(String),
}

impl VersionSpec {
    /// Classify a version token. Maven-style range expressions open with
    /// `[` or `(`; everything else is an exact version.
    pub fn parse(spec: &str) -> Self {
        let s = spec.trim();
        if s.starts_with('[') || s.starts_with('(') {
            VersionSpec::Range(s.to_string())
        } else {
            VersionSpec::Exact(s.to_string())
        }
    }

    /// The exact version, if this is not a range.
    pub fn exact(&self) -> Option<&str> {
        match self {
            VersionSpec::Exact(v) => Some(v),
            VersionSpec::Range(_) => None,
        }
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSpec::Exact(v) | VersionSpec::Range(v) => f.write_str(v),
        }
    }
}

/// Who declared a dependency: the subproject's own manifest or a
/// transitively fetched artifact descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Requester {
    Root,
    Artifact(Coordinate),
}

impl fmt::Display for Requester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requester::Root => f.write_str("bill.toml"),
            Requester::Artifact(c) => c.fmt(f),
        }
    }
}

/// One dependency declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredDependency {
    pub requester: Requester,
    pub target: Coordinate,
    pub version: VersionSpec,
    #[serde(default)]
    pub scope: DeclaredScope,
    /// Coordinates excluded from this declaration's transitive subtree.
    #[serde(default)]
    pub exclusions: BTreeSet<Coordinate>,
    /// Marks a dependency on a sibling subproject rather than a
    /// repository artifact. Path dependencies carry no repository version.
    #[serde(default)]
    pub path: bool,
}

impl DeclaredDependency {
    /// A direct declaration from a subproject manifest.
    pub fn direct(target: Coordinate, version: &str) -> Self {
        Self {
            requester: Requester::Root,
            target,
            version: VersionSpec::parse(version),
            scope: DeclaredScope::default(),
            exclusions: BTreeSet::new(),
            path: false,
        }
    }

    /// A declaration from a fetched artifact descriptor.
    pub fn transitive(requester: Coordinate, target: Coordinate, version: &str) -> Self {
        Self {
            requester: Requester::Artifact(requester),
            target,
            version: VersionSpec::parse(version),
            scope: DeclaredScope::default(),
            exclusions: BTreeSet::new(),
            path: false,
        }
    }

    /// A direct path declaration on the sibling subproject named by
    /// `target.artifact`.
    pub fn path_to(target: Coordinate) -> Self {
        Self {
            requester: Requester::Root,
            target,
            version: VersionSpec::Exact(String::new()),
            scope: DeclaredScope::default(),
            exclusions: BTreeSet::new(),
            path: true,
        }
    }

    pub fn with_scope(mut self, scope: DeclaredScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_exclusion(mut self, excluded: Coordinate) -> Self {
        self.exclusions.insert(excluded);
        self
    }
}
