//! # Domain Entities
//!
//! Block headers, the append-only header chain, and the account whose
//! state a light client reconstructs.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use super::errors::{short_hex, Hash, LightClientError, ZERO_HASH};
use super::hashing::{address_hash, hash_content, Address};
use super::participants::{ParticipantFilter, DEFAULT_FILTER_FPR};
use super::transactions::{AccTx, ConfigTx, FundsTx, TxKind};
use super::value_objects::ChainTip;
use crate::algorithms::compute_merkle_root;

/// Block header as served to light clients.
///
/// Carries the hashes of every transaction in the block, partitioned by
/// kind, but none of the bodies.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockHeader {
    /// Hash of this block, a pure function of the fields below.
    pub hash: Hash,
    /// Hash of the parent block. `ZERO_HASH` for genesis.
    pub prev_hash: Hash,
    /// Block height.
    pub height: u64,
    /// Unix timestamp.
    pub timestamp: u64,
    /// Merkle root over all transaction hashes (funds, acc, config, stake).
    pub merkle_root: Hash,
    /// Address hash of the block producer.
    pub beneficiary: Hash,
    /// Funds transaction hashes in block order.
    pub funds_tx_data: Vec<Hash>,
    /// Account-creation transaction hashes in block order.
    pub acc_tx_data: Vec<Hash>,
    /// Configuration transaction hashes in block order.
    pub config_tx_data: Vec<Hash>,
    /// Stake transaction hashes (not replayed by light clients).
    pub stake_tx_data: Vec<Hash>,
    /// Number of funds transactions.
    pub nr_funds_tx: u16,
    /// Number of account-creation transactions.
    pub nr_acc_tx: u16,
    /// Number of configuration transactions.
    pub nr_config_tx: u16,
    /// Number of stake transactions.
    pub nr_stake_tx: u16,
    /// Filter over participant address hashes.
    pub participants: Option<ParticipantFilter>,
}

impl BlockHeader {
    /// Content hash of this header.
    pub fn compute_hash(&self) -> Hash {
        let mut parts: Vec<&[u8]> = Vec::with_capacity(8 + self.tx_count());
        let height = self.height.to_be_bytes();
        let timestamp = self.timestamp.to_be_bytes();
        let counts: Vec<u8> = [
            self.nr_funds_tx,
            self.nr_acc_tx,
            self.nr_config_tx,
            self.nr_stake_tx,
        ]
        .iter()
        .flat_map(|n| n.to_be_bytes())
        .collect();
        parts.push(&self.prev_hash);
        parts.push(&height);
        parts.push(&timestamp);
        parts.push(&self.merkle_root);
        parts.push(&self.beneficiary);
        parts.push(&counts);
        for hash in self.all_tx_hashes() {
            parts.push(hash);
        }
        if let Some(filter) = &self.participants {
            parts.push(filter.as_bytes());
        }
        hash_content(&parts)
    }

    /// Whether `hash` matches the content.
    pub fn has_valid_hash(&self) -> bool {
        self.hash == self.compute_hash()
    }

    /// Genesis has no parent.
    pub fn is_genesis(&self) -> bool {
        self.prev_hash == ZERO_HASH
    }

    /// All transaction hashes in Merkle leaf order.
    pub fn all_tx_hashes(&self) -> impl Iterator<Item = &Hash> {
        self.funds_tx_data
            .iter()
            .chain(self.acc_tx_data.iter())
            .chain(self.config_tx_data.iter())
            .chain(self.stake_tx_data.iter())
    }

    /// Total number of referenced transactions.
    pub fn tx_count(&self) -> usize {
        self.funds_tx_data.len()
            + self.acc_tx_data.len()
            + self.config_tx_data.len()
            + self.stake_tx_data.len()
    }

    /// Hash list for a transaction kind.
    pub fn tx_data(&self, kind: TxKind) -> &[Hash] {
        match kind {
            TxKind::Funds => &self.funds_tx_data,
            TxKind::Acc => &self.acc_tx_data,
            TxKind::Config => &self.config_tx_data,
        }
    }

    /// Whether the block references `tx_hash` under `kind`.
    pub fn contains_tx(&self, kind: TxKind, tx_hash: &Hash) -> bool {
        self.tx_data(kind).contains(tx_hash)
    }

    /// Whether the per-kind counts agree with the hash lists.
    pub fn counts_consistent(&self) -> bool {
        self.nr_funds_tx as usize == self.funds_tx_data.len()
            && self.nr_acc_tx as usize == self.acc_tx_data.len()
            && self.nr_config_tx as usize == self.config_tx_data.len()
            && self.nr_stake_tx as usize == self.stake_tx_data.len()
    }
}

/// Assembles sealed headers from transaction bodies.
///
/// Used by the in-memory full node and by tests; fills the hash lists,
/// counts, Merkle root, participant filter and block hash.
#[derive(Debug)]
pub struct HeaderBuilder {
    prev_hash: Hash,
    height: u64,
    timestamp: u64,
    beneficiary: Hash,
    funds: Vec<Hash>,
    acc: Vec<Hash>,
    config: Vec<Hash>,
    stake: Vec<Hash>,
    participants: Vec<Hash>,
}

impl HeaderBuilder {
    /// Start a block on top of `prev_hash`.
    pub fn new(prev_hash: Hash, height: u64) -> Self {
        Self {
            prev_hash,
            height,
            timestamp: 1_700_000_000 + height * 15,
            beneficiary: ZERO_HASH,
            funds: Vec::new(),
            acc: Vec::new(),
            config: Vec::new(),
            stake: Vec::new(),
            participants: Vec::new(),
        }
    }

    /// Start a block on top of `parent`.
    pub fn child_of(parent: &BlockHeader) -> Self {
        Self::new(parent.hash, parent.height + 1)
    }

    /// Set the producer's address hash.
    pub fn beneficiary(mut self, beneficiary: Hash) -> Self {
        self.beneficiary = beneficiary;
        self
    }

    /// Set the timestamp.
    pub fn timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Include a funds transaction.
    pub fn funds_tx(mut self, tx: &FundsTx) -> Self {
        self.funds.push(tx.hash());
        self.participants.push(tx.from);
        self.participants.push(tx.to);
        self
    }

    /// Include an account-creation transaction.
    pub fn acc_tx(mut self, tx: &AccTx) -> Self {
        self.acc.push(tx.hash());
        self.participants.push(address_hash(&tx.pub_key));
        self
    }

    /// Include a configuration transaction.
    pub fn config_tx(mut self, tx: &ConfigTx) -> Self {
        self.config.push(tx.hash());
        self
    }

    /// Reference a stake transaction by hash.
    pub fn stake_tx_hash(mut self, hash: Hash) -> Self {
        self.stake.push(hash);
        self
    }

    /// Seal the header.
    pub fn build(self) -> BlockHeader {
        let mut filter = ParticipantFilter::with_capacity(self.participants.len(), DEFAULT_FILTER_FPR);
        for participant in &self.participants {
            filter.insert(participant);
        }
        let leaves: Vec<Hash> = self
            .funds
            .iter()
            .chain(&self.acc)
            .chain(&self.config)
            .chain(&self.stake)
            .copied()
            .collect();
        let mut header = BlockHeader {
            hash: ZERO_HASH,
            prev_hash: self.prev_hash,
            height: self.height,
            timestamp: self.timestamp,
            merkle_root: compute_merkle_root(&leaves),
            beneficiary: self.beneficiary,
            nr_funds_tx: self.funds.len() as u16,
            nr_acc_tx: self.acc.len() as u16,
            nr_config_tx: self.config.len() as u16,
            nr_stake_tx: self.stake.len() as u16,
            funds_tx_data: self.funds,
            acc_tx_data: self.acc,
            config_tx_data: self.config,
            stake_tx_data: self.stake,
            participants: Some(filter),
        };
        header.hash = header.compute_hash();
        header
    }
}

/// Append-only, ancestor-linked list of known headers.
///
/// For every index i > 0, `headers[i].prev_hash == headers[i - 1].hash`.
#[derive(Clone, Debug, Default)]
pub struct HeaderChain {
    /// Headers oldest first.
    headers: Vec<Arc<BlockHeader>>,
    /// Position by hash.
    index: HashMap<Hash, usize>,
}

/// Header chain shared between the catch-up walk, the streaming listener
/// and readers. Never hold the guard across an await point.
pub type SharedHeaderChain = Arc<RwLock<HeaderChain>>;

impl HeaderChain {
    /// Empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header on top of the tip.
    ///
    /// # Errors
    /// - `InvalidHeaderChain` if the header is already known
    /// - `InvalidHeaderChain` if its `prev_hash` is not the tip hash
    pub fn append(&mut self, header: BlockHeader) -> Result<(), LightClientError> {
        if self.index.contains_key(&header.hash) {
            return Err(LightClientError::InvalidHeaderChain(format!(
                "Header {} already known",
                short_hex(&header.hash)
            )));
        }
        if let Some(tip) = self.headers.last() {
            if header.prev_hash != tip.hash {
                return Err(LightClientError::InvalidHeaderChain(format!(
                    "Parent hash mismatch: expected {}, got {}",
                    short_hex(&tip.hash),
                    short_hex(&header.prev_hash)
                )));
            }
        }
        self.index.insert(header.hash, self.headers.len());
        self.headers.push(Arc::new(header));
        Ok(())
    }

    /// Append headers oldest first, skipping ones already known.
    ///
    /// Returns the number appended. A header that does not link to the
    /// tip fails the call; headers before it stay appended.
    pub fn append_batch(&mut self, headers: Vec<BlockHeader>) -> Result<u64, LightClientError> {
        let mut appended = 0;
        for header in headers {
            if self.contains(&header.hash) {
                continue;
            }
            self.append(header)?;
            appended += 1;
        }
        Ok(appended)
    }

    /// Whether `header` would extend the tip.
    pub fn links_to_tip(&self, header: &BlockHeader) -> bool {
        match self.headers.last() {
            Some(tip) => header.prev_hash == tip.hash,
            None => true,
        }
    }

    /// Whether a header with this hash is known.
    pub fn contains(&self, hash: &Hash) -> bool {
        self.index.contains_key(hash)
    }

    /// Get header by hash.
    pub fn get(&self, hash: &Hash) -> Option<&Arc<BlockHeader>> {
        self.index.get(hash).map(|&i| &self.headers[i])
    }

    /// Hash of the newest header, if any.
    pub fn tip_hash(&self) -> Option<Hash> {
        self.headers.last().map(|h| h.hash)
    }

    /// Current tip.
    pub fn tip(&self) -> Option<ChainTip> {
        self.headers.last().map(|h| ChainTip::new(h.hash, h.height))
    }

    /// Number of headers.
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Check if chain is empty.
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Headers known at call time, oldest first.
    pub fn snapshot(&self) -> Vec<Arc<BlockHeader>> {
        self.headers.clone()
    }
}

/// Account whose state is derived by replay.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Public key.
    pub address: Address,
    /// Digest of `address`, as referenced by blocks and transactions.
    pub address_hash: Hash,
    /// Spendable balance.
    pub balance: u64,
    /// Number of transactions sent.
    pub tx_cnt: u32,
    /// Root accounts are never debited.
    pub is_root: bool,
    /// Set once an account-creation transaction naming it is observed.
    pub is_created: bool,
}

impl Account {
    /// Ordinary account with no derived state.
    pub fn new(address: Address) -> Self {
        Self {
            address,
            address_hash: address_hash(&address),
            balance: 0,
            tx_cnt: 0,
            is_root: false,
            is_created: false,
        }
    }

    /// Root account, exempt from debits.
    pub fn root(address: Address) -> Self {
        Self {
            is_root: true,
            ..Self::new(address)
        }
    }

    /// Same identity with derived fields cleared.
    pub fn identity(&self) -> Self {
        Self {
            balance: 0,
            tx_cnt: 0,
            is_created: false,
            ..self.clone()
        }
    }
}
