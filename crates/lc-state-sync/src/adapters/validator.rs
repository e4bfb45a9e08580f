//! Transaction Validator Adapters
//!
//! Implements `TransactionValidator`:
//! - `StructuralValidator`: body hashes to the requested hash and the block
//!   references it under its kind
//! - `MerkleInclusionValidator`: the above, plus a Merkle path fetched from
//!   a peer that must lead to the block's `merkle_root`

use async_trait::async_trait;
use std::sync::Arc;

use crate::algorithms::verify_merkle_proof;
use crate::application::PeerBridge;
use crate::domain::{BlockHeader, Hash, LightClientError, Transaction};
use crate::ports::TransactionValidator;

/// Checks a body against the header that references it.
#[derive(Clone, Copy, Debug, Default)]
pub struct StructuralValidator;

impl StructuralValidator {
    fn check(block: &BlockHeader, tx: &Transaction, tx_hash: &Hash) -> Result<(), LightClientError> {
        if tx.hash() != *tx_hash {
            return Err(LightClientError::validation(*tx_hash, "body does not hash to requested id"));
        }
        if !block.contains_tx(tx.kind(), tx_hash) {
            return Err(LightClientError::validation(
                *tx_hash,
                format!("block {} does not reference this {} tx", block.height, tx.kind()),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl TransactionValidator for StructuralValidator {
    async fn validate(
        &self,
        block: &BlockHeader,
        tx: &Transaction,
        tx_hash: &Hash,
    ) -> Result<(), LightClientError> {
        Self::check(block, tx, tx_hash)
    }
}

/// Structural checks plus a peer-supplied inclusion proof.
pub struct MerkleInclusionValidator {
    bridge: Arc<PeerBridge>,
}

impl MerkleInclusionValidator {
    /// Validator fetching proofs over `bridge`.
    pub fn new(bridge: Arc<PeerBridge>) -> Self {
        Self { bridge }
    }
}

#[async_trait]
impl TransactionValidator for MerkleInclusionValidator {
    async fn validate(
        &self,
        block: &BlockHeader,
        tx: &Transaction,
        tx_hash: &Hash,
    ) -> Result<(), LightClientError> {
        StructuralValidator::check(block, tx, tx_hash)?;

        let path = self
            .bridge
            .request_intermediate_nodes(block.hash, *tx_hash)
            .await?;
        if !verify_merkle_proof(tx_hash, &path, &block.merkle_root) {
            return Err(LightClientError::validation(
                *tx_hash,
                format!("inclusion proof does not match merkle root of block {}", block.height),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{MemoryFullNode, StaticPeerPool};
    use crate::config::LightClientConfig;
    use crate::domain::{FundsTx, HeaderBuilder, ZERO_HASH};

    fn funded_block() -> (BlockHeader, Vec<FundsTx>) {
        let txs: Vec<FundsTx> = (0..3)
            .map(|i| FundsTx::new([1u8; 32], [2u8; 32], 10 + i, 1, i as u32))
            .collect();
        let header = txs
            .iter()
            .fold(HeaderBuilder::new(ZERO_HASH, 0), |b, tx| b.funds_tx(tx))
            .build();
        (header, txs)
    }

    fn merkle_validator() -> (MerkleInclusionValidator, Arc<MemoryFullNode>) {
        let pool = Arc::new(StaticPeerPool::new());
        let (bridge, router) = PeerBridge::new(pool.clone(), &LightClientConfig::for_testing());
        let node = Arc::new(MemoryFullNode::new("node-1", router));
        pool.add_peer(node.clone());
        (MerkleInclusionValidator::new(Arc::new(bridge)), node)
    }

    #[tokio::test]
    async fn test_structural_accepts_referenced_body() {
        let (block, txs) = funded_block();
        let tx = Transaction::Funds(txs[1].clone());
        assert!(StructuralValidator.validate(&block, &tx, &tx.hash()).await.is_ok());
    }

    #[tokio::test]
    async fn test_structural_rejects_unreferenced_body() {
        let (block, _) = funded_block();
        let stray = Transaction::Funds(FundsTx::new([3u8; 32], [4u8; 32], 1, 1, 0));
        let result = StructuralValidator.validate(&block, &stray, &stray.hash()).await;
        assert!(matches!(result, Err(LightClientError::ValidationFailed { .. })));
    }

    #[tokio::test]
    async fn test_structural_rejects_hash_mismatch() {
        let (block, txs) = funded_block();
        let tx = Transaction::Funds(txs[0].clone());
        let other = txs[1].hash();
        assert!(StructuralValidator.validate(&block, &tx, &other).await.is_err());
    }

    #[tokio::test]
    async fn test_merkle_validator_accepts_valid_path() {
        let (validator, node) = merkle_validator();
        let (block, txs) = funded_block();
        node.publish_block(block.clone(), txs.iter().cloned().map(Into::into).collect());
        let tx = Transaction::Funds(txs[2].clone());
        assert!(validator.validate(&block, &tx, &tx.hash()).await.is_ok());
    }

    #[tokio::test]
    async fn test_merkle_validator_rejects_bad_path() {
        let (validator, node) = merkle_validator();
        let (block, txs) = funded_block();
        node.publish_block(block.clone(), txs.iter().cloned().map(Into::into).collect());
        node.set_corrupt_proofs(true);
        let tx = Transaction::Funds(txs[0].clone());
        let result = validator.validate(&block, &tx, &tx.hash()).await;
        assert!(matches!(result, Err(LightClientError::ValidationFailed { .. })));
    }
}
