//! # Light Client State Sync
//!
//! Account-state reconstruction for a blockchain light client.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! A light client keeps no ledger. It recovers one account's balance,
//! transaction count and creation status from untrusted peers:
//! - fetch block headers from the network tip back to the local tip
//! - select the blocks that could touch the account
//! - replay their transactions in chain order, fetching and validating
//!   every body on the way
//!
//! Network parameters changed by configuration transactions are replayed
//! along the way, since the block reward in force decides what a
//! beneficiary is credited.
//!
//! ## Guarantees
//!
//! | Property | How |
//! |----------|-----|
//! | Chain continuity | Every append goes through one write lock and checks the parent hash |
//! | Idempotent catch-up | The walk stops at the local tip; known headers are skipped |
//! | Atomic reconstruction | Replay runs on a copy, committed only on success |
//! | No double counting | Pending transactions confirmed in a block are skipped and pruned |
//!
//! ## Module Structure
//!
//! ```text
//! lc-state-sync/
//! ├── domain/          # Headers, header chain, transactions, parameters, messages, errors
//! ├── algorithms/      # Backward walk, relevance filter, replay effects, Merkle proofs
//! ├── ports/           # API trait (inbound) + peer/validator/rule traits (outbound)
//! ├── application/     # PeerBridge, HeaderSynchronizer, StateReconstructor, LightClientService
//! ├── adapters/        # In-memory full node, static peer pool, validators, parameter rule
//! └── config.rs        # LightClientConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::{
    BoundedParameterRule, MemoryFullNode, MerkleInclusionValidator, StaticPeerPool,
    StructuralValidator,
};
pub use algorithms::{
    build_merkle_proof, compute_merkle_root, is_relevant, relevant_blocks, validate_header,
    validate_header_batch, verify_merkle_proof, BackwardWalk, ReplayState, WalkStep,
};
pub use application::{
    HeaderSynchronizer, LightClientService, PeerBridge, ResponseRouter, StateReconstructor,
};
pub use config::LightClientConfig;
pub use domain::{
    address_hash, AccTx, Account, ActiveParameters, Address, BlockHeader, ChainTip, ConfigTx,
    FundsTx, Hash, HeaderBuilder, HeaderChain, LightClientError, ParameterId, PendingTxPools,
    ReconstructionReport, RecentTx, RecentTxLog, Request, Response, ResponseChannel,
    SharedHeaderChain, SyncResult, Transaction, TxKind, TxStatus, ZERO_HASH,
};
pub use ports::{LightClientApi, ParameterRule, PeerConnection, PeerPool, TransactionValidator};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
