//! # Peer Messages
//!
//! Requests a light client sends to one peer, and the responses routed
//! back to it on one channel per response kind.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::entities::{Account, BlockHeader};
use super::errors::{short_hex, Hash};
use super::transactions::{Transaction, TxKind};
use super::value_objects::ProofNode;

/// Request for one piece of chain data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Request {
    /// Header by hash; `None` asks for the peer's current tip.
    BlockHeader(Option<Hash>),
    /// Transaction body by kind and hash.
    Transaction {
        /// Kind of the transaction.
        kind: TxKind,
        /// Content hash.
        hash: Hash,
    },
    /// Merkle path of a transaction inside a block.
    IntermediateNodes {
        /// Block containing the transaction.
        block_hash: Hash,
        /// Transaction hash.
        tx_hash: Hash,
    },
    /// Account record by address hash, among root or ordinary accounts.
    Account {
        /// Look among root accounts.
        root: bool,
        /// Digest of the account address.
        address_hash: Hash,
    },
}

impl Request {
    /// Channel the answer arrives on.
    pub fn channel(&self) -> ResponseChannel {
        match self {
            Request::BlockHeader(_) => ResponseChannel::BlockHeader,
            Request::Transaction { kind, .. } => ResponseChannel::for_tx_kind(*kind),
            Request::IntermediateNodes { .. } => ResponseChannel::IntermediateNodes,
            Request::Account { .. } => ResponseChannel::Account,
        }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::BlockHeader(None) => write!(f, "block header (tip)"),
            Request::BlockHeader(Some(hash)) => write!(f, "block header {}", short_hex(hash)),
            Request::Transaction { kind, hash } => write!(f, "{} tx {}", kind, short_hex(hash)),
            Request::IntermediateNodes {
                block_hash,
                tx_hash,
            } => write!(
                f,
                "intermediate nodes of tx {} in block {}",
                short_hex(tx_hash),
                short_hex(block_hash)
            ),
            Request::Account { root: true, address_hash } => {
                write!(f, "root account {}", short_hex(address_hash))
            }
            Request::Account { root: false, address_hash } => {
                write!(f, "account {}", short_hex(address_hash))
            }
        }
    }
}

/// Answer from a peer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    /// A block header.
    BlockHeader(BlockHeader),
    /// A transaction body.
    Transaction(Transaction),
    /// Merkle path of a transaction inside a block.
    IntermediateNodes {
        /// Block containing the transaction.
        block_hash: Hash,
        /// Transaction hash.
        tx_hash: Hash,
        /// Sibling hashes from leaf to root.
        path: Vec<ProofNode>,
    },
    /// Answer to an account request. `account` is `None` when the peer
    /// knows no such account of the requested kind.
    Account {
        /// Whether root accounts were searched.
        root: bool,
        /// Digest of the account address.
        address_hash: Hash,
        /// The account record, if found.
        account: Option<Account>,
    },
}

impl Response {
    /// Channel this response is routed to.
    pub fn channel(&self) -> ResponseChannel {
        match self {
            Response::BlockHeader(_) => ResponseChannel::BlockHeader,
            Response::Transaction(tx) => ResponseChannel::for_tx_kind(tx.kind()),
            Response::IntermediateNodes { .. } => ResponseChannel::IntermediateNodes,
            Response::Account { .. } => ResponseChannel::Account,
        }
    }

    /// Short description for logs and errors.
    pub fn describe(&self) -> String {
        match self {
            Response::BlockHeader(header) => format!("block header {}", short_hex(&header.hash)),
            Response::Transaction(tx) => format!("{} tx {}", tx.kind(), short_hex(&tx.hash())),
            Response::IntermediateNodes { tx_hash, .. } => {
                format!("intermediate nodes of tx {}", short_hex(tx_hash))
            }
            Response::Account {
                address_hash,
                account,
                ..
            } => format!(
                "account {} ({})",
                short_hex(address_hash),
                if account.is_some() { "found" } else { "unknown" }
            ),
        }
    }
}

/// One inbound queue per response kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseChannel {
    /// Block headers.
    BlockHeader,
    /// Funds transaction bodies.
    FundsTx,
    /// Account-creation transaction bodies.
    AccTx,
    /// Configuration transaction bodies.
    ConfigTx,
    /// Merkle paths.
    IntermediateNodes,
    /// Account records.
    Account,
}

impl ResponseChannel {
    /// Every channel.
    pub const ALL: [ResponseChannel; 6] = [
        ResponseChannel::BlockHeader,
        ResponseChannel::FundsTx,
        ResponseChannel::AccTx,
        ResponseChannel::ConfigTx,
        ResponseChannel::IntermediateNodes,
        ResponseChannel::Account,
    ];

    /// Channel carrying bodies of `kind`.
    pub fn for_tx_kind(kind: TxKind) -> Self {
        match kind {
            TxKind::Funds => ResponseChannel::FundsTx,
            TxKind::Acc => ResponseChannel::AccTx,
            TxKind::Config => ResponseChannel::ConfigTx,
        }
    }
}

impl fmt::Display for ResponseChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResponseChannel::BlockHeader => "block-header",
            ResponseChannel::FundsTx => "funds-tx",
            ResponseChannel::AccTx => "acc-tx",
            ResponseChannel::ConfigTx => "config-tx",
            ResponseChannel::IntermediateNodes => "intermediate-nodes",
            ResponseChannel::Account => "account",
        };
        f.write_str(name)
    }
}
