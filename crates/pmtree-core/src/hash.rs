//! Content-addressed hashing for process-model trees.
//!
//! A tree is hashed through its identity-free [`Shape`](crate::tree::Shape):
//! operators, task labels, and child order, but not the random node ids.
//! Structurally identical trees therefore hash equal and can be deduplicated.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// A 32-byte SHA-256 content hash.
pub type ContentHash = [u8; 32];

/// Compute the SHA-256 content hash of any serializable value.
pub fn content_hash<T: Serialize>(value: &T) -> ContentHash {
    let json = serde_json::to_vec(value).expect("shape serialization should not fail");
    let mut hasher = Sha256::new();
    hasher.update(&json);
    hasher.finalize().into()
}

/// Format a content hash as a hex string.
pub fn hash_hex(hash: &ContentHash) -> String {
    hash.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Tree;

    #[test]
    fn identical_shapes_hash_equal() {
        let a: Tree = "SEQ(A,XOR(B,C))".parse().unwrap();
        let b = a.deep_copy();
        assert_eq!(a.structural_hash(), b.structural_hash());
    }

    #[test]
    fn operator_changes_hash() {
        let a: Tree = "SEQ(A,B)".parse().unwrap();
        let b: Tree = "PAR(A,B)".parse().unwrap();
        assert_ne!(a.structural_hash(), b.structural_hash());
    }

    #[test]
    fn hash_hex_format() {
        let hex = hash_hex(&Tree::task("A").structural_hash());
        assert_eq!(hex.len(), 64); // 32 bytes * 2 hex chars each
    }
}
