//! Checksum calculation for catalog provenance.

use sha2::{Digest, Sha256};

use super::domain::FieldCatalog;
use crate::error::Result;

/// Calculate SHA-256 checksum of arbitrary text content.
///
/// # Returns
/// Hexadecimal string representation of the SHA-256 hash.
pub fn calculate_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    hex::encode(result)
}

/// Checksum of a catalog's static content (ids, positions, bands, tilings,
/// priorities, exposures). Observed flags are excluded so the value is
/// stable across a run.
pub fn catalog_checksum(catalog: &FieldCatalog) -> Result<String> {
    let rows: Vec<_> = catalog
        .fields()
        .iter()
        .map(|f| {
            (
                f.id.value(),
                f.ra.value(),
                f.dec.value(),
                f.band.as_str(),
                f.tiling,
                f.priority,
                f.exposure.value(),
            )
        })
        .collect();
    let json = serde_json::to_string(&rows)?;
    Ok(calculate_checksum(&json))
}
