//! # Light Client Service
//!
//! Owns the header chain, the peer bridge, the active parameters and the
//! pending pools, and exposes synchronization and reconstruction through
//! [`LightClientApi`].

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::bridge::{PeerBridge, ResponseRouter};
use super::reconstructor::StateReconstructor;
use super::synchronizer::HeaderSynchronizer;
use crate::adapters::{BoundedParameterRule, MerkleInclusionValidator, StructuralValidator};
use crate::algorithms::ReplayState;
use crate::config::LightClientConfig;
use crate::domain::{
    short_hex, AccTx, Account, ActiveParameters, BlockHeader, ChainTip, ConfigTx, FundsTx, Hash,
    HeaderChain, LightClientError, PendingTxPools, ReconstructionReport, RecentTxLog,
    SharedHeaderChain, SyncResult,
};
use crate::ports::{LightClientApi, ParameterRule, PeerPool, TransactionValidator};

/// Light Client Service - one synchronization and reconstruction context.
pub struct LightClientService {
    /// Configuration.
    config: LightClientConfig,
    /// Header chain shared with the synchronizer.
    chain: SharedHeaderChain,
    /// Peer bridge shared with the synchronizer and reconstructor.
    bridge: Arc<PeerBridge>,
    synchronizer: HeaderSynchronizer,
    reconstructor: StateReconstructor,
    /// Parameters from the last successful reconstruction.
    parameters: RwLock<ActiveParameters>,
    /// Locally authored transactions not yet seen in a block.
    pending: RwLock<PendingTxPools>,
}

impl LightClientService {
    /// Create a service over `pool` with the stock validator and rule.
    ///
    /// Returns the router the peer transport must deliver responses to.
    pub fn new(
        config: LightClientConfig,
        pool: Arc<dyn PeerPool>,
    ) -> Result<(Self, ResponseRouter), LightClientError> {
        config.validate()?;
        let (bridge, router) = PeerBridge::new(pool, &config);
        let bridge = Arc::new(bridge);
        let validator: Arc<dyn TransactionValidator> = if config.verify_inclusion_proofs {
            Arc::new(MerkleInclusionValidator::new(bridge.clone()))
        } else {
            Arc::new(StructuralValidator)
        };
        let service = Self::with_ports(config, bridge, validator, Arc::new(BoundedParameterRule));
        Ok((service, router))
    }

    /// Create a service from explicit ports.
    pub fn with_ports(
        config: LightClientConfig,
        bridge: Arc<PeerBridge>,
        validator: Arc<dyn TransactionValidator>,
        rule: Arc<dyn ParameterRule>,
    ) -> Self {
        let chain: SharedHeaderChain = Arc::new(RwLock::new(HeaderChain::new()));
        let synchronizer = HeaderSynchronizer::new(bridge.clone(), chain.clone(), config.clone());
        let reconstructor =
            StateReconstructor::new(bridge.clone(), validator, rule, config.tx_cache_size);
        Self {
            config,
            chain,
            bridge,
            synchronizer,
            reconstructor,
            parameters: RwLock::new(ActiveParameters::default()),
            pending: RwLock::new(PendingTxPools::new()),
        }
    }

    /// Catch up, then start appending headers from `incoming`.
    ///
    /// The listener is only started once the catch-up walk succeeded.
    pub async fn synchronize(
        &self,
        incoming: mpsc::Receiver<BlockHeader>,
    ) -> Result<JoinHandle<()>, LightClientError> {
        self.synchronizer.catch_up().await?;
        Ok(self.synchronizer.spawn_listener(incoming))
    }

    /// Shared handle to the header chain.
    pub fn header_chain(&self) -> SharedHeaderChain {
        self.chain.clone()
    }

    /// Get configuration.
    pub fn config(&self) -> &LightClientConfig {
        &self.config
    }

    /// Number of peers requests can go to.
    pub fn peer_count(&self) -> usize {
        self.bridge.peer_count()
    }

    /// Record a locally authored funds transaction.
    pub fn submit_funds_tx(&self, tx: FundsTx) -> Hash {
        self.pending.write().insert_funds(tx)
    }

    /// Record a locally authored account-creation transaction.
    pub fn submit_acc_tx(&self, tx: AccTx) -> Hash {
        self.pending.write().insert_acc(tx)
    }

    /// Record a locally authored configuration transaction.
    pub fn submit_config_tx(&self, tx: ConfigTx) -> Hash {
        self.pending.write().insert_config(tx)
    }

    /// Pending funds transactions sent or received by `address_hash`.
    pub fn pending_funds_for(&self, address_hash: &Hash) -> Vec<(Hash, FundsTx)> {
        self.pending.read().funds_for(address_hash)
    }

    /// Number of pending transactions of any kind.
    pub fn pending_count(&self) -> usize {
        self.pending.read().len()
    }
}

#[async_trait]
impl LightClientApi for LightClientService {
    async fn catch_up(&self) -> Result<SyncResult, LightClientError> {
        self.synchronizer.catch_up().await
    }

    async fn reconstruct_account_state(
        &self,
        account: &mut Account,
        recent: &mut RecentTxLog,
    ) -> Result<ReconstructionReport, LightClientError> {
        let headers = self.chain.read().snapshot();
        let pending = self.pending_funds_for(&account.address_hash);

        let mut log = recent.clone();
        log.clear();
        let start = ReplayState::new(account.identity(), ActiveParameters::default(), log);

        let state = self.reconstructor.reconstruct(&headers, start, &pending).await?;
        let (derived, parameters, log, report) = state.into_parts();

        *account = derived;
        *recent = log;
        *self.parameters.write() = parameters;
        if !report.confirmed_pending.is_empty() {
            let mut pools = self.pending.write();
            for hash in &report.confirmed_pending {
                pools.remove(hash);
            }
            debug!(pruned = report.confirmed_pending.len(), "Pruned confirmed pending transactions");
        }
        Ok(report)
    }

    async fn resolve_root_status(&self, account: &mut Account) -> Result<bool, LightClientError> {
        let is_root = self.bridge.is_root_account(account.address_hash).await?;
        if is_root != account.is_root {
            info!(
                account = %short_hex(&account.address_hash),
                is_root,
                "Root status updated from peer"
            );
        }
        account.is_root = is_root;
        Ok(is_root)
    }

    fn chain_tip(&self) -> Option<ChainTip> {
        self.chain.read().tip()
    }

    fn is_synced(&self) -> bool {
        self.synchronizer.is_synced()
    }

    fn header_count(&self) -> usize {
        self.chain.read().len()
    }

    fn active_parameters(&self) -> ActiveParameters {
        self.parameters.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{MemoryFullNode, StaticPeerPool};
    use crate::domain::{address_hash, HeaderBuilder, TxStatus, ZERO_HASH};

    const ME: [u8; 32] = [1u8; 32];
    const PEER: [u8; 32] = [2u8; 32];

    fn service() -> (LightClientService, Arc<MemoryFullNode>) {
        let pool = Arc::new(StaticPeerPool::new());
        let (service, router) =
            LightClientService::new(LightClientConfig::for_testing(), pool.clone()).unwrap();
        let node = Arc::new(MemoryFullNode::new("node-1", router));
        pool.add_peer(node.clone());
        (service, node)
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let config = LightClientConfig {
            fetch_timeout_ms: 0,
            ..LightClientConfig::for_testing()
        };
        let result = LightClientService::new(config, Arc::new(StaticPeerPool::new()));
        assert!(matches!(result, Err(LightClientError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_reconstruction_is_repeatable() {
        let (service, node) = service();
        let gift = FundsTx::new(address_hash(&PEER), address_hash(&ME), 25, 1, 0);
        let genesis = HeaderBuilder::new(ZERO_HASH, 0).funds_tx(&gift).build();
        node.publish_block(genesis, vec![gift.into()]);
        service.catch_up().await.unwrap();

        let mut account = Account::new(ME);
        let mut recent = RecentTxLog::default();
        service.reconstruct_account_state(&mut account, &mut recent).await.unwrap();
        service.reconstruct_account_state(&mut account, &mut recent).await.unwrap();

        assert_eq!(account.balance, 25);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent.latest().unwrap().status, TxStatus::Verified);
    }

    #[tokio::test]
    async fn test_failed_reconstruction_leaves_account_untouched() {
        let (service, node) = service();
        let gift = FundsTx::new(address_hash(&PEER), address_hash(&ME), 25, 1, 0);
        let genesis = HeaderBuilder::new(ZERO_HASH, 0).funds_tx(&gift).build();
        node.publish_block(genesis, vec![]);
        service.catch_up().await.unwrap();

        let mut account = Account::new(ME);
        account.balance = 3;
        let mut recent = RecentTxLog::default();
        assert!(service
            .reconstruct_account_state(&mut account, &mut recent)
            .await
            .is_err());
        assert_eq!(account.balance, 3);
        assert!(recent.is_empty());
    }

    #[tokio::test]
    async fn test_pending_merged_and_pruned_once_confirmed() {
        let (service, node) = service();
        let me = address_hash(&ME);
        let reward = ConfigTx::new(5, 50, 0, 0);
        let genesis = HeaderBuilder::new(ZERO_HASH, 0)
            .beneficiary(me)
            .config_tx(&reward)
            .build();
        let funded = HeaderBuilder::child_of(&genesis).beneficiary(me).build();
        node.publish_block(genesis, vec![reward.into()]);
        node.publish_block(funded.clone(), vec![]);
        service.catch_up().await.unwrap();

        let spend = FundsTx::new(me, address_hash(&PEER), 10, 1, 0);
        let hash = service.submit_funds_tx(spend.clone());

        let mut account = Account::new(ME);
        let mut recent = RecentTxLog::default();
        let report = service
            .reconstruct_account_state(&mut account, &mut recent)
            .await
            .unwrap();
        assert_eq!(report.pending_applied, 1);
        assert_eq!(account.balance, 50);
        assert_eq!(account.tx_cnt, 1);

        let confirming = HeaderBuilder::child_of(&funded).funds_tx(&spend).build();
        node.publish_block(confirming, vec![spend.into()]);
        service.catch_up().await.unwrap();

        let report = service
            .reconstruct_account_state(&mut account, &mut recent)
            .await
            .unwrap();
        assert_eq!(report.confirmed_pending, vec![hash]);
        assert_eq!(account.balance, 39);
        assert_eq!(account.tx_cnt, 1);
        assert_eq!(service.pending_count(), 0);
        assert_eq!(service.active_parameters().block_reward, 50);
    }

    #[tokio::test]
    async fn test_synchronize_starts_listener() {
        let (service, node) = service();
        let genesis = HeaderBuilder::new(ZERO_HASH, 0).build();
        node.publish_block(genesis.clone(), vec![]);

        let (tx, rx) = mpsc::channel(4);
        let handle = service.synchronize(rx).await.unwrap();
        assert!(service.is_synced());

        let next = HeaderBuilder::child_of(&genesis).build();
        tx.send(next.clone()).await.unwrap();
        drop(tx);
        handle.await.unwrap();

        assert_eq!(service.header_count(), 2);
        assert_eq!(service.chain_tip().unwrap().hash, next.hash);
    }

    #[tokio::test]
    async fn test_root_status_learned_from_peer() {
        let (service, node) = service();
        node.register_account(Account::root(ME));
        let me = address_hash(&ME);
        let grant = FundsTx::new(me, address_hash(&PEER), 10, 1, 0);
        let genesis = HeaderBuilder::new(ZERO_HASH, 0).funds_tx(&grant).build();
        node.publish_block(genesis, vec![grant.into()]);
        service.catch_up().await.unwrap();

        let mut account = Account::new(ME);
        let mut recent = RecentTxLog::default();
        assert!(service
            .reconstruct_account_state(&mut account, &mut recent)
            .await
            .is_err());

        assert!(service.resolve_root_status(&mut account).await.unwrap());
        assert!(account.is_root);
        service.reconstruct_account_state(&mut account, &mut recent).await.unwrap();
        assert_eq!(account.balance, 0);
        assert_eq!(account.tx_cnt, 1);
    }

    #[tokio::test]
    async fn test_root_status_untouched_when_peer_offline() {
        let (service, node) = service();
        node.set_offline(true);
        let mut account = Account::root(ME);
        assert!(service.resolve_root_status(&mut account).await.is_err());
        assert!(account.is_root);
    }
}
