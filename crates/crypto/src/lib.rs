//! Mintgate cryptographic primitives
//!
//! Keccak-256 hashing and the sorted-pair Merkle scheme used to commit to
//! cumulative allocation snapshots.

pub mod hash_functions;
pub mod merkle_trees;

pub use hash_functions::{hash_pair_sorted, keccak256, keccak256_concat, to_hex};
pub use merkle_trees::{
    allocation_leaf, process_proof, verify_sorted_proof, AllocationProof, MerkleError,
    SortedMerkleTree,
};
