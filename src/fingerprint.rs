//! Canonical serialization and matrix fingerprints.
//!
//! A fingerprint is the xxh64 of a matrix's canonical JSON form. Two
//! resolutions over the same catalog, floor and policy always produce
//! the same fingerprint, which is what idempotence checks and change
//! confirmations compare.
//!
//! ## Determinism Guarantees
//!
//! - Stable field order: struct fields serialize in declaration order
//! - Stable map order: matrices are `BTreeMap`s, keyed by version string
//! - No HashMap allowed in fingerprinted data

use serde::Serialize;
use xxhash_rust::xxh64::xxh64;

use crate::types::Matrix;

/// Serialize a value to canonical JSON bytes for hashing.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).expect("Canonical serialization failed")
}

/// Compute the canonical hash of a serializable value.
pub fn canonical_hash<T: Serialize>(value: &T) -> u64 {
    let bytes = to_canonical_bytes(value);
    xxh64(&bytes, 0)
}

/// Compute the canonical hash and return it as a hex string.
pub fn canonical_hash_hex<T: Serialize>(value: &T) -> String {
    format!("{:016x}", canonical_hash(value))
}

/// Fingerprint of a resolved matrix, as reported in API responses and
/// resolution logs.
pub fn matrix_fingerprint(matrix: &Matrix) -> String {
    canonical_hash_hex(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CatalogEntry, Component};

    fn matrix(versions: &[&str]) -> Matrix {
        versions
            .iter()
            .map(|v| {
                (
                    v.to_string(),
                    Component::from_entry(&CatalogEntry::available(
                        format!("percona/pxc:{v}"),
                        format!("hash-{v}"),
                    )),
                )
            })
            .collect()
    }

    #[test]
    fn identical_matrices_share_a_fingerprint() {
        let a = matrix(&["8.0.19-10.1", "8.0.21-12.1"]);
        let b = matrix(&["8.0.21-12.1", "8.0.19-10.1"]);
        assert_eq!(matrix_fingerprint(&a), matrix_fingerprint(&b));
    }

    #[test]
    fn flag_changes_change_the_fingerprint() {
        let a = matrix(&["8.0.19-10.1"]);
        let mut b = a.clone();
        b.get_mut("8.0.19-10.1").unwrap().disabled = true;
        assert_ne!(matrix_fingerprint(&a), matrix_fingerprint(&b));
    }

    #[test]
    fn fingerprint_is_sixteen_hex_digits() {
        let fp = matrix_fingerprint(&matrix(&["8.0.19-10.1"]));
        assert_eq!(fp.len(), 16);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
