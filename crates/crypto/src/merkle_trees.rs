//! Sorted-pair Merkle trees for cumulative allocation roots
//!
//! Each internal node is `keccak256(min(l, r) || max(l, r))`, so a proof is a
//! plain list of sibling hashes with no direction bits. Leaves commit to an
//! `(account, cumulative amount)` pair and are double hashed so a leaf can
//! never be confused with an internal node.
//!
//! Only verification runs in the claim path; [`SortedMerkleTree`] exists for
//! tooling and fixtures that need to produce roots and proofs locally.

use crate::hash_functions::{hash_pair_sorted, keccak256, keccak256_concat};
use mintgate_types::{Address, Amount, Hash32};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MerkleError {
    #[error("cannot build a tree without leaves")]
    EmptyTree,
    #[error("leaf index {index} out of range for {leaves} leaves")]
    InvalidIndex { index: usize, leaves: usize },
}

/// Leaf committing `account` to a cumulative entitlement of `amount`.
///
/// The amount is encoded as a 32-byte big-endian word.
pub fn allocation_leaf(account: &Address, amount: Amount) -> Hash32 {
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&amount.to_be_bytes());
    let inner = keccak256_concat(&[account.as_bytes().as_slice(), word.as_slice()]);
    keccak256(&inner)
}

/// Fold `leaf` up through `proof`, returning the implied root.
pub fn process_proof(proof: &[Hash32], leaf: Hash32) -> Hash32 {
    proof
        .iter()
        .fold(leaf, |node, sibling| hash_pair_sorted(&node, sibling))
}

/// True iff `proof` shows `leaf` is committed by `root`.
pub fn verify_sorted_proof(proof: &[Hash32], root: &Hash32, leaf: Hash32) -> bool {
    process_proof(proof, leaf) == *root
}

/// Inclusion proof for one allocation, in the shape off-chain tooling hands
/// to claimants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationProof {
    pub account: Address,
    pub cumulative_amount: Amount,
    pub proof: Vec<Hash32>,
}

impl AllocationProof {
    pub fn verify(&self, root: &Hash32) -> bool {
        verify_sorted_proof(
            &self.proof,
            root,
            allocation_leaf(&self.account, self.cumulative_amount),
        )
    }
}

/// Full binary tree over a fixed leaf set. An unpaired node at the end of a
/// level is promoted unchanged.
#[derive(Debug, Clone)]
pub struct SortedMerkleTree {
    levels: Vec<Vec<Hash32>>,
}

impl SortedMerkleTree {
    pub fn from_leaves(leaves: Vec<Hash32>) -> Result<Self, MerkleError> {
        if leaves.is_empty() {
            return Err(MerkleError::EmptyTree);
        }

        let mut levels = vec![leaves];
        while levels[levels.len() - 1].len() > 1 {
            let current = &levels[levels.len() - 1];
            let next: Vec<Hash32> = current
                .chunks(2)
                .map(|pair| match pair {
                    [left, right] => hash_pair_sorted(left, right),
                    [single] => *single,
                    _ => unreachable!("chunks(2) yields one or two items"),
                })
                .collect();
            levels.push(next);
        }

        Ok(Self { levels })
    }

    /// Tree over `(account, cumulative amount)` allocations, in the given order.
    pub fn from_allocations(allocations: &[(Address, Amount)]) -> Result<Self, MerkleError> {
        Self::from_leaves(
            allocations
                .iter()
                .map(|(account, amount)| allocation_leaf(account, *amount))
                .collect(),
        )
    }

    pub fn root(&self) -> Hash32 {
        self.levels[self.levels.len() - 1][0]
    }

    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    pub fn height(&self) -> usize {
        self.levels.len() - 1
    }

    pub fn proof(&self, leaf_index: usize) -> Result<Vec<Hash32>, MerkleError> {
        if leaf_index >= self.leaf_count() {
            return Err(MerkleError::InvalidIndex {
                index: leaf_index,
                leaves: self.leaf_count(),
            });
        }

        let mut path = Vec::with_capacity(self.height());
        let mut index = leaf_index;
        for level in &self.levels[..self.levels.len() - 1] {
            let sibling = index ^ 1;
            if sibling < level.len() {
                path.push(level[sibling]);
            }
            index /= 2;
        }
        Ok(path)
    }

    /// Convenience for allocation trees: proof bundle for leaf `index`.
    pub fn allocation_proof(
        &self,
        index: usize,
        account: Address,
        cumulative_amount: Amount,
    ) -> Result<AllocationProof, MerkleError> {
        Ok(AllocationProof {
            account,
            cumulative_amount,
            proof: self.proof(index)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::{Rng, SeedableRng};

    fn allocations(n: usize) -> Vec<(Address, Amount)> {
        (0..n)
            .map(|i| (Address::derive(&format!("holder-{i}")), (i as Amount + 1) * 100))
            .collect()
    }

    #[test]
    fn empty_tree_rejected() {
        assert_eq!(
            SortedMerkleTree::from_leaves(Vec::new()).unwrap_err(),
            MerkleError::EmptyTree
        );
    }

    #[test]
    fn single_leaf_root_is_the_leaf() {
        let alice = Address::derive("alice");
        let tree = SortedMerkleTree::from_allocations(&[(alice, 300)]).unwrap();
        assert_eq!(tree.root(), allocation_leaf(&alice, 300));
        assert!(tree.proof(0).unwrap().is_empty());
        assert!(verify_sorted_proof(&[], &tree.root(), allocation_leaf(&alice, 300)));
    }

    #[test]
    fn every_leaf_verifies_for_odd_and_even_sizes() {
        for n in [2usize, 3, 5, 8, 13] {
            let allocs = allocations(n);
            let tree = SortedMerkleTree::from_allocations(&allocs).unwrap();
            for (i, (account, amount)) in allocs.iter().enumerate() {
                let proof = tree.allocation_proof(i, *account, *amount).unwrap();
                assert!(proof.verify(&tree.root()), "leaf {i} of {n}");
            }
        }
    }

    #[test]
    fn wrong_amount_or_account_fails() {
        let allocs = allocations(4);
        let tree = SortedMerkleTree::from_allocations(&allocs).unwrap();
        let proof = tree.proof(1).unwrap();
        let (account, amount) = allocs[1];

        assert!(!verify_sorted_proof(&proof, &tree.root(), allocation_leaf(&account, amount + 1)));
        assert!(!verify_sorted_proof(
            &proof,
            &tree.root(),
            allocation_leaf(&Address::derive("mallory"), amount)
        ));
    }

    #[test]
    fn out_of_range_index() {
        let tree = SortedMerkleTree::from_allocations(&allocations(3)).unwrap();
        assert_eq!(
            tree.proof(3).unwrap_err(),
            MerkleError::InvalidIndex { index: 3, leaves: 3 }
        );
    }

    #[test]
    fn proof_from_one_root_does_not_verify_under_another() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let mut allocs = allocations(6);
        let first = SortedMerkleTree::from_allocations(&allocs).unwrap();
        for entry in allocs.iter_mut() {
            entry.1 += rng.gen_range(1..1_000);
        }
        let second = SortedMerkleTree::from_allocations(&allocs).unwrap();

        let proof = first.proof(2).unwrap();
        let leaf = allocation_leaf(&allocs[2].0, allocs[2].1);
        assert!(!verify_sorted_proof(&proof, &second.root(), leaf));
    }

    proptest! {
        #[test]
        fn tampered_proofs_never_verify(
            n in 2usize..24,
            pick in any::<prop::sample::Index>(),
            flip_byte in 0usize..32,
        ) {
            let allocs = allocations(n);
            let tree = SortedMerkleTree::from_allocations(&allocs).unwrap();
            let i = pick.index(n);
            let mut proof = tree.proof(i).unwrap();
            prop_assert!(!proof.is_empty());
            proof[0][flip_byte] ^= 0x01;
            let leaf = allocation_leaf(&allocs[i].0, allocs[i].1);
            prop_assert!(!verify_sorted_proof(&proof, &tree.root(), leaf));
        }
    }
}
