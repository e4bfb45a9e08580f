//! # Domain Value Objects
//!
//! Immutable value types for header sync and state reconstruction.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::errors::Hash;
use super::transactions::FundsTx;

/// Capacity of the recent transaction log.
pub const DEFAULT_RECENT_TX_CAPACITY: usize = 10;

/// Current chain tip information.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChainTip {
    /// Current tip block hash.
    pub hash: Hash,
    /// Current tip block height.
    pub height: u64,
}

impl ChainTip {
    /// Create a new chain tip.
    pub fn new(hash: Hash, height: u64) -> Self {
        Self { hash, height }
    }
}

/// Result of a catch-up walk.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncResult {
    /// Number of headers appended.
    pub headers_synced: u64,
    /// Chain tip after sync.
    pub tip: Option<ChainTip>,
    /// Time taken in milliseconds.
    pub duration_ms: u64,
}

impl SyncResult {
    /// Create a sync result.
    pub fn new(headers_synced: u64, tip: Option<ChainTip>, duration_ms: u64) -> Self {
        Self {
            headers_synced,
            tip,
            duration_ms,
        }
    }
}

/// Position in Merkle proof (left or right sibling).
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Position {
    /// Sibling is on the left.
    Left,
    /// Sibling is on the right.
    Right,
}

/// Node in a Merkle proof path.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProofNode {
    /// Hash of the sibling node.
    pub hash: Hash,
    /// Position of the sibling.
    pub position: Position,
}

impl ProofNode {
    /// Create a left sibling node.
    pub fn left(hash: Hash) -> Self {
        Self {
            hash,
            position: Position::Left,
        }
    }

    /// Create a right sibling node.
    pub fn right(hash: Hash) -> Self {
        Self {
            hash,
            position: Position::Right,
        }
    }
}

/// Whether a logged transaction was found inside a block.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum TxStatus {
    /// Included in a known block and validated.
    #[serde(rename = "verified")]
    Verified,
    /// Still pending.
    #[serde(rename = "not verified")]
    NotVerified,
}

/// Entry of the recent transaction log.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecentTx {
    /// Transaction hash.
    pub hash: Hash,
    /// Transaction body.
    pub tx: FundsTx,
    /// Confirmation status.
    pub status: TxStatus,
}

/// Most recent incoming transactions of an account, oldest evicted first.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecentTxLog {
    capacity: usize,
    entries: VecDeque<RecentTx>,
}

impl Default for RecentTxLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_RECENT_TX_CAPACITY)
    }
}

impl RecentTxLog {
    /// Log holding at most `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Append an entry, evicting the oldest when full.
    pub fn push(&mut self, hash: Hash, tx: FundsTx, status: TxStatus) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(RecentTx { hash, tx, status });
    }

    /// Entries oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &RecentTx> {
        self.entries.iter()
    }

    /// Newest entry.
    pub fn latest(&self) -> Option<&RecentTx> {
        self.entries.back()
    }

    /// Drop all entries, keeping the capacity.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the log is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Summary of one reconstruction.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReconstructionReport {
    /// Headers known when the reconstruction started.
    pub blocks_scanned: usize,
    /// Headers selected by the relevance filter.
    pub candidate_blocks: usize,
    /// Transactions that changed the account.
    pub transactions_applied: usize,
    /// Pending transactions merged in.
    pub pending_applied: usize,
    /// Configuration transactions that changed a parameter.
    pub parameter_changes: usize,
    /// Pending transactions found confirmed in a block.
    pub confirmed_pending: Vec<Hash>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(amount: u64) -> FundsTx {
        FundsTx::new([1u8; 32], [2u8; 32], amount, 1, 0)
    }

    #[test]
    fn test_recent_log_evicts_oldest() {
        let mut log = RecentTxLog::with_capacity(2);
        log.push([1u8; 32], tx(1), TxStatus::Verified);
        log.push([2u8; 32], tx(2), TxStatus::Verified);
        log.push([3u8; 32], tx(3), TxStatus::NotVerified);
        assert_eq!(log.len(), 2);
        let amounts: Vec<u64> = log.iter().map(|e| e.tx.amount).collect();
        assert_eq!(amounts, vec![2, 3]);
        assert_eq!(log.latest().unwrap().status, TxStatus::NotVerified);
    }

    #[test]
    fn test_zero_capacity_log_stays_empty() {
        let mut log = RecentTxLog::with_capacity(0);
        log.push([1u8; 32], tx(1), TxStatus::Verified);
        assert!(log.is_empty());
    }

    #[test]
    fn test_status_serializes_like_wallet_json() {
        let json = serde_json::to_string(&TxStatus::NotVerified).unwrap();
        assert_eq!(json, "\"not verified\"");
    }

    #[test]
    fn test_proof_node_positions() {
        let left = ProofNode::left([7u8; 32]);
        let right = ProofNode::right([8u8; 32]);
        assert_eq!(left.position, Position::Left);
        assert_eq!(right.position, Position::Right);
    }
}
