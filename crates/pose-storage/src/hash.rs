//! Content hashing for pose sequences.

use sha2::{Digest, Sha256};

/// SHA-256 hex digest of the canonical JSON form of a sequence.
///
/// The canonical form is compact JSON, so the same sequence always yields
/// the same hash. Frame order is part of the content.
pub fn generate_sequence_hash<F: AsRef<[f64]>>(sequence: &[F]) -> String {
    let frames: Vec<&[f64]> = sequence.iter().map(|f| f.as_ref()).collect();
    // A list of float lists has no map keys and always serializes.
    let canonical = serde_json::to_string(&frames).unwrap_or_default();
    hex_digest(canonical.as_bytes())
}

fn hex_digest(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    format!("{:x}", digest)
}
