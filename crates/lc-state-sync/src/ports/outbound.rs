//! # Outbound Ports
//!
//! Traits for external dependencies: peers, transaction validation and the
//! parameter update rule.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::{ActiveParameters, BlockHeader, ConfigTx, Hash, LightClientError, Request, Transaction};

/// Connection to one peer - outbound port.
///
/// Responses arrive asynchronously through the `ResponseRouter` the
/// transport was given, never as the return value of `send`.
#[async_trait]
pub trait PeerConnection: Send + Sync {
    /// Peer identifier (for logging/debugging).
    fn peer_id(&self) -> &str;

    /// Send a request to this peer.
    async fn send(&self, request: Request) -> Result<(), LightClientError>;
}

/// Set of live peer connections - outbound port.
pub trait PeerPool: Send + Sync {
    /// A connection chosen uniformly at random, `None` if there is none.
    fn random_peer(&self) -> Option<Arc<dyn PeerConnection>>;

    /// Number of live connections.
    fn peer_count(&self) -> usize;
}

/// Transaction validation - outbound port.
///
/// Called with a body already fetched for `tx_hash` out of `block`.
#[async_trait]
pub trait TransactionValidator: Send + Sync {
    /// Fail with `ValidationFailed` if the body is not acceptable.
    async fn validate(
        &self,
        block: &BlockHeader,
        tx: &Transaction,
        tx_hash: &Hash,
    ) -> Result<(), LightClientError>;
}

/// Parameter update rule - outbound port.
pub trait ParameterRule: Send + Sync {
    /// Parameters after applying `txs` in order to `current`.
    fn apply(&self, current: &ActiveParameters, txs: &[ConfigTx]) -> ActiveParameters;
}
