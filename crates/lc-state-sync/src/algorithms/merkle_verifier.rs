//! # Merkle Proof Verification
//!
//! Inclusion proofs of transactions against a header's `merkle_root`.
//! Leaves are the block's transaction hashes in `all_tx_hashes` order; an
//! odd node at any level is paired with itself.

use sha2::{Digest, Sha256};

use crate::domain::{BlockHeader, Hash, Position, ProofNode, ZERO_HASH};

/// Verify that `proof_path` leads from `tx_hash` to `expected_root`.
///
/// For each node: sibling on the left hashes as SHA256(sibling || current),
/// on the right as SHA256(current || sibling).
pub fn verify_merkle_proof(tx_hash: &Hash, proof_path: &[ProofNode], expected_root: &Hash) -> bool {
    let root = proof_path.iter().fold(*tx_hash, |current, node| match node.position {
        Position::Left => hash_concat(&node.hash, &current),
        Position::Right => hash_concat(&current, &node.hash),
    });
    root == *expected_root
}

fn hash_concat(left: &Hash, right: &Hash) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

fn next_level(level: &[Hash]) -> Vec<Hash> {
    level
        .chunks(2)
        .map(|pair| hash_concat(&pair[0], pair.get(1).unwrap_or(&pair[0])))
        .collect()
}

/// Merkle root of `leaves`. `ZERO_HASH` for a block without transactions.
pub fn compute_merkle_root(leaves: &[Hash]) -> Hash {
    match leaves {
        [] => ZERO_HASH,
        [single] => *single,
        _ => {
            let mut level = leaves.to_vec();
            while level.len() > 1 {
                level = next_level(&level);
            }
            level[0]
        }
    }
}

/// Proof path for the leaf at `index`, or `None` if out of range.
pub fn build_merkle_proof(leaves: &[Hash], index: usize) -> Option<Vec<ProofNode>> {
    if index >= leaves.len() {
        return None;
    }

    let mut proof = Vec::new();
    let mut level = leaves.to_vec();
    let mut index = index;

    while level.len() > 1 {
        let node = if index % 2 == 0 {
            // Unpaired last node is hashed with itself.
            ProofNode::right(*level.get(index + 1).unwrap_or(&level[index]))
        } else {
            ProofNode::left(level[index - 1])
        };
        proof.push(node);
        level = next_level(&level);
        index /= 2;
    }

    Some(proof)
}

/// Proof path of `tx_hash` inside `header`, if the header references it.
pub fn merkle_path_for(header: &BlockHeader, tx_hash: &Hash) -> Option<Vec<ProofNode>> {
    let leaves: Vec<Hash> = header.all_tx_hashes().copied().collect();
    let index = leaves.iter().position(|leaf| leaf == tx_hash)?;
    build_merkle_proof(&leaves, index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FundsTx, HeaderBuilder};

    fn make_hash(n: u8) -> Hash {
        let mut h = [0u8; 32];
        h[0] = n;
        h
    }

    #[test]
    fn test_single_leaf_is_root() {
        let tx_hash = make_hash(1);
        assert_eq!(compute_merkle_root(&[tx_hash]), tx_hash);
        assert!(verify_merkle_proof(&tx_hash, &[], &tx_hash));
    }

    #[test]
    fn test_empty_root() {
        assert_eq!(compute_merkle_root(&[]), ZERO_HASH);
    }

    #[test]
    fn test_two_leaves() {
        let (a, b) = (make_hash(1), make_hash(2));
        let root = compute_merkle_root(&[a, b]);
        assert_eq!(root, hash_concat(&a, &b));
        assert!(verify_merkle_proof(&a, &[ProofNode::right(b)], &root));
        assert!(verify_merkle_proof(&b, &[ProofNode::left(a)], &root));
    }

    #[test]
    fn test_tampered_sibling_fails() {
        let (a, b) = (make_hash(1), make_hash(2));
        let root = compute_merkle_root(&[a, b]);
        assert!(!verify_merkle_proof(&a, &[ProofNode::right(make_hash(99))], &root));
    }

    #[test]
    fn test_every_leaf_of_odd_tree_proves() {
        let leaves: Vec<Hash> = (1..=7).map(make_hash).collect();
        let root = compute_merkle_root(&leaves);
        for (i, leaf) in leaves.iter().enumerate() {
            let proof = build_merkle_proof(&leaves, i).unwrap();
            assert!(verify_merkle_proof(leaf, &proof, &root), "leaf {} failed", i);
        }
    }

    #[test]
    fn test_out_of_range_index() {
        let leaves: Vec<Hash> = (1..=4).map(make_hash).collect();
        assert!(build_merkle_proof(&leaves, 4).is_none());
    }

    #[test]
    fn test_path_for_header_transaction() {
        let txs: Vec<FundsTx> = (0..3)
            .map(|i| FundsTx::new(make_hash(1), make_hash(2), 10 + i, 1, i as u32))
            .collect();
        let header = txs
            .iter()
            .fold(HeaderBuilder::new(ZERO_HASH, 0), |b, tx| b.funds_tx(tx))
            .build();
        let target = txs[2].hash();
        let path = merkle_path_for(&header, &target).unwrap();
        assert!(verify_merkle_proof(&target, &path, &header.merkle_root));
        assert!(merkle_path_for(&header, &make_hash(42)).is_none());
    }
}
