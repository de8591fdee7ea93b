//! Keccak-256 helpers
//!
//! Allocation roots are produced by off-chain tooling that uses Keccak-256, so
//! verification here must use the same function byte for byte.

use mintgate_types::Hash32;
use sha3::{Digest, Keccak256};

/// Keccak-256 of `data`.
pub fn keccak256(data: &[u8]) -> Hash32 {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Keccak-256 over the concatenation of `parts` without intermediate copies.
pub fn keccak256_concat(parts: &[&[u8]]) -> Hash32 {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Hash two nodes after ordering them, so proofs need no left/right flags.
pub fn hash_pair_sorted(a: &Hash32, b: &Hash32) -> Hash32 {
    if a <= b {
        keccak256_concat(&[a.as_slice(), b.as_slice()])
    } else {
        keccak256_concat(&[b.as_slice(), a.as_slice()])
    }
}

pub fn to_hex(hash: &Hash32) -> String {
    format!("0x{}", hex::encode(hash))
}
