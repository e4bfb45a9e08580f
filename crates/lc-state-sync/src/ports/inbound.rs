//! # Inbound Ports
//!
//! API trait defining what the light client can do.

use async_trait::async_trait;

use crate::domain::{
    Account, ActiveParameters, ChainTip, LightClientError, ReconstructionReport, RecentTxLog,
    SyncResult,
};

/// Light Client API - inbound port.
#[async_trait]
pub trait LightClientApi: Send + Sync {
    /// Walk from the network tip back to the local tip and append what was
    /// found. Calling it again with no new blocks appends nothing.
    async fn catch_up(&self) -> Result<SyncResult, LightClientError>;

    /// Replay the header chain known at call time for `account`.
    ///
    /// Derived fields of `account` and the contents of `recent` are
    /// rebuilt from scratch and written back only if the whole replay
    /// succeeds. On error both are left untouched.
    async fn reconstruct_account_state(
        &self,
        account: &mut Account,
        recent: &mut RecentTxLog,
    ) -> Result<ReconstructionReport, LightClientError>;

    /// Ask a peer whether `account` is a root account and record the
    /// answer in `account.is_root`. On error `account` is left untouched.
    async fn resolve_root_status(&self, account: &mut Account) -> Result<bool, LightClientError>;

    /// Get current chain tip.
    fn chain_tip(&self) -> Option<ChainTip>;

    /// Check if the catch-up walk has completed.
    fn is_synced(&self) -> bool;

    /// Number of headers in the local chain.
    fn header_count(&self) -> usize;

    /// Parameters produced by the last successful reconstruction.
    fn active_parameters(&self) -> ActiveParameters;
}
