//! # Transactions
//!
//! The three transaction kinds a light client replays. Stake transactions
//! are referenced by headers but never fetched.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::Hash;
use super::hashing::{hash_content, Address};

/// Transaction kind, used to pick the request type and response channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxKind {
    /// Funds transfer.
    Funds,
    /// Account creation.
    Acc,
    /// Configuration (parameter) change.
    Config,
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxKind::Funds => write!(f, "funds"),
            TxKind::Acc => write!(f, "acc"),
            TxKind::Config => write!(f, "config"),
        }
    }
}

/// Transfer of `amount` from one account hash to another.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundsTx {
    /// Transferred amount.
    pub amount: u64,
    /// Fee paid to the block beneficiary.
    pub fee: u64,
    /// Sender's transaction counter at signing time.
    pub tx_cnt: u32,
    /// Sender address hash.
    pub from: Hash,
    /// Recipient address hash.
    pub to: Hash,
    /// Free-form payload.
    #[serde(default)]
    pub data: Vec<u8>,
}

impl FundsTx {
    /// Create a transfer without payload.
    pub fn new(from: Hash, to: Hash, amount: u64, fee: u64, tx_cnt: u32) -> Self {
        Self {
            amount,
            fee,
            tx_cnt,
            from,
            to,
            data: Vec::new(),
        }
    }

    /// Content hash.
    pub fn hash(&self) -> Hash {
        hash_content(&[
            b"funds",
            &self.amount.to_be_bytes(),
            &self.fee.to_be_bytes(),
            &self.tx_cnt.to_be_bytes(),
            &self.from,
            &self.to,
            &self.data,
        ])
    }

    /// Amount plus fee, the sender's total debit.
    pub fn total_debit(&self) -> Option<u64> {
        self.amount.checked_add(self.fee)
    }
}

/// Creation of the account owning `pub_key`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccTx {
    /// Address hash of the issuing root account.
    pub issuer: Hash,
    /// Fee paid to the block beneficiary.
    pub fee: u64,
    /// Public key of the created account.
    pub pub_key: Address,
}

impl AccTx {
    /// Create an account-creation transaction.
    pub fn new(issuer: Hash, pub_key: Address, fee: u64) -> Self {
        Self {
            issuer,
            fee,
            pub_key,
        }
    }

    /// Content hash.
    pub fn hash(&self) -> Hash {
        hash_content(&[b"acc", &self.issuer, &self.fee.to_be_bytes(), &self.pub_key])
    }
}

/// Change of one network parameter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigTx {
    /// Parameter id, see `ParameterId`.
    pub id: u8,
    /// New value.
    pub payload: u64,
    /// Fee paid to the block beneficiary.
    pub fee: u64,
    /// Issuer's counter, keeps otherwise identical changes distinct.
    pub tx_cnt: u8,
}

impl ConfigTx {
    /// Create a configuration transaction.
    pub fn new(id: u8, payload: u64, fee: u64, tx_cnt: u8) -> Self {
        Self {
            id,
            payload,
            fee,
            tx_cnt,
        }
    }

    /// Content hash.
    pub fn hash(&self) -> Hash {
        hash_content(&[
            b"config",
            &[self.id],
            &self.payload.to_be_bytes(),
            &self.fee.to_be_bytes(),
            &[self.tx_cnt],
        ])
    }
}

/// Any transaction body a peer can return.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transaction {
    /// Funds transfer.
    Funds(FundsTx),
    /// Account creation.
    Acc(AccTx),
    /// Parameter change.
    Config(ConfigTx),
}

impl Transaction {
    /// Kind of this transaction.
    pub fn kind(&self) -> TxKind {
        match self {
            Transaction::Funds(_) => TxKind::Funds,
            Transaction::Acc(_) => TxKind::Acc,
            Transaction::Config(_) => TxKind::Config,
        }
    }

    /// Content hash.
    pub fn hash(&self) -> Hash {
        match self {
            Transaction::Funds(tx) => tx.hash(),
            Transaction::Acc(tx) => tx.hash(),
            Transaction::Config(tx) => tx.hash(),
        }
    }

    /// Fee paid to the block beneficiary.
    pub fn fee(&self) -> u64 {
        match self {
            Transaction::Funds(tx) => tx.fee,
            Transaction::Acc(tx) => tx.fee,
            Transaction::Config(tx) => tx.fee,
        }
    }
}

impl From<FundsTx> for Transaction {
    fn from(tx: FundsTx) -> Self {
        Transaction::Funds(tx)
    }
}

impl From<AccTx> for Transaction {
    fn from(tx: AccTx) -> Self {
        Transaction::Acc(tx)
    }
}

impl From<ConfigTx> for Transaction {
    fn from(tx: ConfigTx) -> Self {
        Transaction::Config(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashes_are_kind_separated() {
        let funds = FundsTx::new([1u8; 32], [2u8; 32], 10, 1, 0);
        let acc = AccTx::new([1u8; 32], [2u8; 32], 1);
        assert_ne!(funds.hash(), acc.hash());
    }

    #[test]
    fn test_hash_covers_amount() {
        let a = FundsTx::new([1u8; 32], [2u8; 32], 10, 1, 0);
        let b = FundsTx::new([1u8; 32], [2u8; 32], 11, 1, 0);
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn test_transaction_dispatch() {
        let tx: Transaction = ConfigTx::new(5, 40, 2, 0).into();
        assert_eq!(tx.kind(), TxKind::Config);
        assert_eq!(tx.fee(), 2);
        assert_eq!(tx.hash(), ConfigTx::new(5, 40, 2, 0).hash());
    }

    #[test]
    fn test_total_debit_overflow() {
        let tx = FundsTx::new([1u8; 32], [2u8; 32], u64::MAX, 1, 0);
        assert_eq!(tx.total_debit(), None);
    }
}
