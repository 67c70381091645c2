//! Version mediation: one winning version per coordinate, fail-fast.
//!
//! A direct declaration pins its coordinate unconditionally. Without a
//! pin, more than one distinct requested version is an error; there is no
//! nearest-wins fallback. Versions compare by exact string equality.

use std::collections::BTreeMap;

use bill_core::coordinate::Coordinate;

use crate::builder::RawGraph;
use crate::error::{ConflictReport, ConflictingVersion, ResolveError};

/// Collapse the raw multigraph into one winning version per coordinate.
pub fn mediate(
    raw: &RawGraph,
    pins: &BTreeMap<Coordinate, String>,
) -> Result<BTreeMap<Coordinate, String>, ResolveError> {
    let mut winners = BTreeMap::new();

    for (coordinate, requested) in raw.requested_versions() {
        if let Some(pin) = pins.get(coordinate) {
            if requested.len() > 1 {
                tracing::debug!(
                    "{} requested at {} versions; direct pin {} wins",
                    coordinate,
                    requested.len(),
                    pin
                );
            }
            winners.insert(coordinate.clone(), pin.clone());
            continue;
        }

        let mut versions = requested.iter();
        match (versions.next(), versions.next()) {
            (Some(only), None) => {
                winners.insert(coordinate.clone(), (*only).to_string());
            }
            _ => {
                let report = ConflictReport {
                    coordinate: coordinate.clone(),
                    versions: requested
                        .iter()
                        .map(|version| ConflictingVersion {
                            version: (*version).to_string(),
                            chains: raw.chains_for(coordinate, version),
                        })
                        .collect(),
                };
                return Err(ResolveError::Conflict { report });
            }
        }
    }

    Ok(winners)
}
