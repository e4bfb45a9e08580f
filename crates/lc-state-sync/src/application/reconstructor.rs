//! # State Reconstructor
//!
//! Replays the relevant blocks of a header chain for one account.
//!
//! Per block, oldest first:
//! 1. block reward to the beneficiary
//! 2. funds transactions
//! 3. account-creation transactions
//! 4. configuration transactions (parameter changes apply to every account)
//!
//! Pending transactions are merged last. Stake transactions are ignored.

use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::{debug, info};

use super::bridge::PeerBridge;
use crate::algorithms::{relevant_blocks, ReplayState};
use crate::domain::{
    short_hex, BlockHeader, FundsTx, Hash, LightClientError, Transaction, TxKind,
};
use crate::ports::{ParameterRule, TransactionValidator};

/// Fetches, validates and replays transactions of candidate blocks.
pub struct StateReconstructor {
    bridge: Arc<PeerBridge>,
    validator: Arc<dyn TransactionValidator>,
    rule: Arc<dyn ParameterRule>,
    /// Bodies never change once fetched.
    tx_cache: Mutex<LruCache<Hash, Transaction>>,
}

impl StateReconstructor {
    /// Create a reconstructor caching up to `cache_size` transaction bodies.
    pub fn new(
        bridge: Arc<PeerBridge>,
        validator: Arc<dyn TransactionValidator>,
        rule: Arc<dyn ParameterRule>,
        cache_size: usize,
    ) -> Self {
        let capacity = NonZeroUsize::new(cache_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            bridge,
            validator,
            rule,
            tx_cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Replay `headers` (oldest first) into `state`, then merge `pending`.
    ///
    /// Stops at the first fetch, validation or arithmetic failure.
    pub async fn reconstruct(
        &self,
        headers: &[Arc<BlockHeader>],
        mut state: ReplayState,
        pending: &[(Hash, FundsTx)],
    ) -> Result<ReplayState, LightClientError> {
        let candidates = relevant_blocks(headers, &state.account.address_hash);
        state.report.blocks_scanned = headers.len();
        state.report.candidate_blocks = candidates.len();
        debug!(
            scanned = headers.len(),
            candidates = candidates.len(),
            "Replaying candidate blocks"
        );

        for block in &candidates {
            self.replay_block(block, &mut state).await?;
        }
        state.apply_pending(pending);

        info!(
            balance = state.account.balance,
            tx_cnt = state.account.tx_cnt,
            applied = state.report.transactions_applied,
            pending = state.report.pending_applied,
            "Account state reconstructed"
        );
        Ok(state)
    }

    async fn replay_block(&self, block: &BlockHeader, state: &mut ReplayState) -> Result<(), LightClientError> {
        state.apply_block_reward(block)?;

        for hash in &block.funds_tx_data {
            let tx = self.fetch_tx(TxKind::Funds, *hash).await?;
            let Transaction::Funds(funds) = &tx else {
                return Err(kind_mismatch(TxKind::Funds, &tx));
            };
            if !state.funds_tx_concerns(block, funds) {
                continue;
            }
            self.validator.validate(block, &tx, hash).await?;
            state.apply_funds_tx(block, *hash, funds)?;
        }

        for hash in &block.acc_tx_data {
            let tx = self.fetch_tx(TxKind::Acc, *hash).await?;
            let Transaction::Acc(acc) = &tx else {
                return Err(kind_mismatch(TxKind::Acc, &tx));
            };
            if !state.acc_tx_concerns(block, acc) {
                continue;
            }
            self.validator.validate(block, &tx, hash).await?;
            state.apply_acc_tx(block, acc)?;
        }

        for hash in &block.config_tx_data {
            let tx = self.fetch_tx(TxKind::Config, *hash).await?;
            let Transaction::Config(config) = &tx else {
                return Err(kind_mismatch(TxKind::Config, &tx));
            };
            if state.is_beneficiary(block) {
                self.validator.validate(block, &tx, hash).await?;
                state.collect_config_fee(config)?;
            }
            let updated = self.rule.apply(&state.parameters, std::slice::from_ref(config));
            if updated != state.parameters {
                debug!(
                    height = block.height,
                    tx = %short_hex(hash),
                    id = config.id,
                    payload = config.payload,
                    "Parameter changed"
                );
            }
            state.update_parameters(updated);
        }

        Ok(())
    }

    async fn fetch_tx(&self, kind: TxKind, hash: Hash) -> Result<Transaction, LightClientError> {
        let cached = self.tx_cache.lock().get(&hash).cloned();
        if let Some(tx) = cached {
            return Ok(tx);
        }
        let tx = self.bridge.request_transaction(kind, hash).await?;
        self.tx_cache.lock().put(hash, tx.clone());
        Ok(tx)
    }

    /// Bodies currently cached.
    pub fn cached_transactions(&self) -> usize {
        self.tx_cache.lock().len()
    }
}

fn kind_mismatch(expected: TxKind, got: &Transaction) -> LightClientError {
    LightClientError::UnexpectedResponse {
        expected: format!("{expected} tx"),
        got: format!("{} tx {}", got.kind(), short_hex(&got.hash())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{
        BoundedParameterRule, MemoryFullNode, StaticPeerPool, StructuralValidator,
    };
    use crate::config::LightClientConfig;
    use crate::domain::{
        address_hash, AccTx, Account, ActiveParameters, ConfigTx, HeaderBuilder, RecentTxLog,
        ZERO_HASH,
    };

    const ME: [u8; 32] = [1u8; 32];

    fn reconstructor() -> (StateReconstructor, Arc<MemoryFullNode>) {
        let config = LightClientConfig::for_testing();
        let pool = Arc::new(StaticPeerPool::new());
        let (bridge, router) = PeerBridge::new(pool.clone(), &config);
        let node = Arc::new(MemoryFullNode::new("node-1", router));
        pool.add_peer(node.clone());
        let reconstructor = StateReconstructor::new(
            Arc::new(bridge),
            Arc::new(StructuralValidator),
            Arc::new(BoundedParameterRule),
            config.tx_cache_size,
        );
        (reconstructor, node)
    }

    fn fresh_state() -> ReplayState {
        ReplayState::new(Account::new(ME), ActiveParameters::default(), RecentTxLog::default())
    }

    #[tokio::test]
    async fn test_reward_change_applies_from_next_block() {
        let (rc, node) = reconstructor();
        let me = address_hash(&ME);
        let raise = ConfigTx::new(5, 40, 0, 0);
        let b0 = HeaderBuilder::new(ZERO_HASH, 0).beneficiary(me).config_tx(&raise).build();
        let b1 = HeaderBuilder::child_of(&b0).beneficiary(me).build();
        node.publish_block(b0.clone(), vec![raise.into()]);
        node.publish_block(b1.clone(), vec![]);

        let headers = vec![Arc::new(b0), Arc::new(b1)];
        let state = rc.reconstruct(&headers, fresh_state(), &[]).await.unwrap();
        assert_eq!(state.account.balance, 40);
        assert_eq!(state.parameters.block_reward, 40);
        assert_eq!(state.report.parameter_changes, 1);
    }

    #[tokio::test]
    async fn test_foreign_transactions_fetched_not_applied() {
        let (rc, node) = reconstructor();
        let foreign = FundsTx::new([7u8; 32], [8u8; 32], 5, 1, 0);
        let incoming = FundsTx::new([7u8; 32], address_hash(&ME), 9, 1, 1);
        let block = HeaderBuilder::new(ZERO_HASH, 0)
            .funds_tx(&foreign)
            .funds_tx(&incoming)
            .build();
        node.publish_block(block.clone(), vec![foreign.into(), incoming.into()]);

        let state = rc
            .reconstruct(&[Arc::new(block)], fresh_state(), &[])
            .await
            .unwrap();
        assert_eq!(state.account.balance, 9);
        assert_eq!(state.report.transactions_applied, 1);
        assert_eq!(rc.cached_transactions(), 2);
    }

    #[tokio::test]
    async fn test_account_creation_observed() {
        let (rc, node) = reconstructor();
        let create = AccTx::new([0u8; 32], ME, 2);
        let block = HeaderBuilder::new(ZERO_HASH, 0).acc_tx(&create).build();
        node.publish_block(block.clone(), vec![create.into()]);

        let state = rc
            .reconstruct(&[Arc::new(block)], fresh_state(), &[])
            .await
            .unwrap();
        assert!(state.account.is_created);
    }

    #[tokio::test]
    async fn test_missing_body_aborts() {
        let (rc, node) = reconstructor();
        let incoming = FundsTx::new([7u8; 32], address_hash(&ME), 9, 1, 0);
        let block = HeaderBuilder::new(ZERO_HASH, 0).funds_tx(&incoming).build();
        node.publish_block(block.clone(), vec![]);

        let result = rc.reconstruct(&[Arc::new(block)], fresh_state(), &[]).await;
        assert!(result.is_err());
    }
}
