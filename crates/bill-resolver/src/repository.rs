//! The repository collaborator seam: descriptor lookup by exact
//! versioned coordinate.

use std::collections::HashMap;
use std::future::Future;

use bill_core::coordinate::{Coordinate, VersionedCoordinate};
use bill_core::dependency::DeclaredDependency;
use miette::Diagnostic;
use thiserror::Error;

/// Failure modes reported by a descriptor source.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum FetchError {
    #[error("descriptor not found in any configured repository")]
    NotFound,

    #[error("network error: {0}")]
    Network(String),

    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },
}

/// Supplies the declared dependencies of an exact versioned coordinate.
///
/// Implementations own transport, on-disk caching, checksum verification,
/// and retry policy. The resolver treats every error as fatal for the
/// owning subproject. Independent subprojects resolve concurrently, so
/// implementations must tolerate (and should deduplicate) concurrent
/// requests for the same coordinate and version.
pub trait DescriptorSource: Send + Sync {
    fn fetch_descriptor(
        &self,
        coordinate: &Coordinate,
        version: &str,
    ) -> impl Future<Output = Result<Vec<DeclaredDependency>, FetchError>> + Send;
}

/// A descriptor source backed by a fixed in-memory table.
///
/// Unknown coordinates report [`FetchError::NotFound`]; artifacts without
/// dependencies must be registered with an empty descriptor. Used by
/// tests and offline resolution.
#[derive(Debug, Default)]
pub struct StaticSource {
    descriptors: HashMap<VersionedCoordinate, Vec<DeclaredDependency>>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        coordinate: VersionedCoordinate,
        dependencies: Vec<DeclaredDependency>,
    ) {
        self.descriptors.insert(coordinate, dependencies);
    }
}

impl DescriptorSource for StaticSource {
    async fn fetch_descriptor(
        &self,
        coordinate: &Coordinate,
        version: &str,
    ) -> Result<Vec<DeclaredDependency>, FetchError> {
        let key = VersionedCoordinate::new(coordinate.clone(), version);
        self.descriptors
            .get(&key)
            .cloned()
            .ok_or(FetchError::NotFound)
    }
}
