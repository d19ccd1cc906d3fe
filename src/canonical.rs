//! Canonical serialization for deterministic hashing.
//!
//! Graph fingerprints, config parameter hashes and report hashes are all
//! computed here, so two runs over the same input agree byte for byte.
//!
//! ## Determinism Guarantees
//!
//! - Stable field order: Struct fields serialize in declaration order
//! - Stable Vec order: Vectors serialize in index order
//! - No HashMap allowed: Use BTreeMap for maps in hashed data

use serde::Serialize;
use xxhash_rust::xxh64::xxh64;

/// Serialize a value to canonical JSON bytes for hashing.
///
/// # Panics
///
/// Panics if `value` cannot be written as JSON, for example a map keyed by
/// tuples. The crate's own types always serialize.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).expect("Canonical serialization failed")
}

/// Compute canonical hash of a serializable value.
pub fn canonical_hash<T: Serialize>(value: &T) -> u64 {
    let bytes = to_canonical_bytes(value);
    xxh64(&bytes, 0)
}

/// Compute canonical hash and return as hex string.
pub fn canonical_hash_hex<T: Serialize>(value: &T) -> String {
    format!("{:016x}", canonical_hash(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    struct Entry {
        parasite: String,
        host: Option<String>,
    }

    #[test]
    fn test_determinism() {
        let e = Entry {
            parasite: "p1".to_string(),
            host: Some("h1".to_string()),
        };

        assert_eq!(canonical_hash(&e), canonical_hash(&e));
        assert_eq!(canonical_hash_hex(&e).len(), 16);
    }

    #[test]
    fn test_btreemap_order_independent_of_insertion() {
        let mut a = BTreeMap::new();
        a.insert("h2", 1);
        a.insert("h1", 2);
        let mut b = BTreeMap::new();
        b.insert("h1", 2);
        b.insert("h2", 1);

        assert_eq!(canonical_hash(&a), canonical_hash(&b));
    }

    #[test]
    #[should_panic(expected = "Canonical serialization failed")]
    fn test_unserializable_value_panics() {
        let mut keyed_by_pair = BTreeMap::new();
        keyed_by_pair.insert((1u8, 2u8), 3u8);
        canonical_hash(&keyed_by_pair);
    }
}
