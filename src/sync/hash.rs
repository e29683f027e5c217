//! Content hashing.
//!
//! Two entities are the same if their serialized JSON hashes the same.
//! Used by conflict detection to flag collisions that would be no-ops.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// SHA256 hex digest of the JSON serialization of `value`.
///
/// `None` if the value cannot be serialized.
#[must_use]
pub fn content_hash<T: Serialize>(value: &T) -> Option<String> {
    let json = serde_json::to_vec(value).ok()?;
    let mut hasher = Sha256::new();
    hasher.update(&json);
    Some(format!("{:x}", hasher.finalize()))
}

/// Whether two values have the same content hash.
#[must_use]
pub fn same_content<T: Serialize>(a: &T, b: &T) -> bool {
    match (content_hash(a), content_hash(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Record {
        id: String,
        value: i32,
    }

    #[test]
    fn test_content_hash_deterministic() {
        let record = Record {
            id: "p1".into(),
            value: 42,
        };

        let hash = content_hash(&record).unwrap();
        assert_eq!(content_hash(&record).unwrap(), hash);
        assert_eq!(hash.len(), 64);
    }

    #[test]
    fn test_same_content() {
        let a = Record {
            id: "p1".into(),
            value: 42,
        };
        let b = Record {
            id: "p1".into(),
            value: 43,
        };
        assert!(same_content(&a, &a));
        assert!(!same_content(&a, &b));
    }
}
