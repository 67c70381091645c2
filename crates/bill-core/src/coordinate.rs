use std::fmt;

use serde::{Deserialize, Serialize};

/// Version-independent artifact identity: group plus artifact name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
    pub group: String,
    pub artifact: String,
}

impl Coordinate {
    pub fn new(group: impl Into<String>, artifact: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
        }
    }

    /// Parse `"group:artifact"` into a coordinate.
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [group, artifact] if !group.is_empty() && !artifact.is_empty() => {
                Some(Self::new(*group, *artifact))
            }
            _ => None,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.artifact)
    }
}

/// An exact artifact identity: coordinate plus version.
///
/// Versions are opaque strings compared by exact equality; bill never
/// interprets them semantically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VersionedCoordinate {
    pub coordinate: Coordinate,
    pub version: String,
}

impl VersionedCoordinate {
    pub fn new(coordinate: Coordinate, version: impl Into<String>) -> Self {
        Self {
            coordinate,
            version: version.into(),
        }
    }

    /// Parse `"group:artifact:version"`.
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [group, artifact, version]
                if !group.is_empty() && !artifact.is_empty() && !version.is_empty() =>
            {
                Some(Self::new(Coordinate::new(*group, *artifact), *version))
            }
            _ => None,
        }
    }
}

impl fmt::Display for VersionedCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.coordinate, self.version)
    }
}
