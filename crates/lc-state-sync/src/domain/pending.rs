//! Pools of transactions this client authored that no known block
//! contains yet.

use std::collections::HashMap;

use super::errors::Hash;
use super::transactions::{AccTx, ConfigTx, FundsTx};

/// Locally authored, not yet confirmed transactions keyed by hash.
#[derive(Clone, Debug, Default)]
pub struct PendingTxPools {
    funds: HashMap<Hash, FundsTx>,
    acc: HashMap<Hash, AccTx>,
    config: HashMap<Hash, ConfigTx>,
}

impl PendingTxPools {
    /// Empty pools.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a funds transaction, returning its hash.
    pub fn insert_funds(&mut self, tx: FundsTx) -> Hash {
        let hash = tx.hash();
        self.funds.insert(hash, tx);
        hash
    }

    /// Add an account-creation transaction, returning its hash.
    pub fn insert_acc(&mut self, tx: AccTx) -> Hash {
        let hash = tx.hash();
        self.acc.insert(hash, tx);
        hash
    }

    /// Add a configuration transaction, returning its hash.
    pub fn insert_config(&mut self, tx: ConfigTx) -> Hash {
        let hash = tx.hash();
        self.config.insert(hash, tx);
        hash
    }

    /// Pending funds transactions sent or received by `address_hash`,
    /// ordered by sender counter.
    pub fn funds_for(&self, address_hash: &Hash) -> Vec<(Hash, FundsTx)> {
        let mut txs: Vec<(Hash, FundsTx)> = self
            .funds
            .iter()
            .filter(|(_, tx)| tx.from == *address_hash || tx.to == *address_hash)
            .map(|(hash, tx)| (*hash, tx.clone()))
            .collect();
        txs.sort_by(|a, b| a.1.tx_cnt.cmp(&b.1.tx_cnt).then(a.0.cmp(&b.0)));
        txs
    }

    /// Forget a transaction of any kind. Returns whether it was pending.
    pub fn remove(&mut self, hash: &Hash) -> bool {
        self.funds.remove(hash).is_some()
            || self.acc.remove(hash).is_some()
            || self.config.remove(hash).is_some()
    }

    /// Total pending transactions.
    pub fn len(&self) -> usize {
        self.funds.len() + self.acc.len() + self.config.len()
    }

    /// Check if all pools are empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_funds_for_filters_by_participant() {
        let me = [1u8; 32];
        let mut pools = PendingTxPools::new();
        pools.insert_funds(FundsTx::new(me, [2u8; 32], 10, 1, 1));
        pools.insert_funds(FundsTx::new([3u8; 32], me, 5, 1, 0));
        pools.insert_funds(FundsTx::new([3u8; 32], [4u8; 32], 5, 1, 0));
        let mine = pools.funds_for(&me);
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].1.tx_cnt, 0);
    }

    #[test]
    fn test_remove_any_kind() {
        let mut pools = PendingTxPools::new();
        let hash = pools.insert_config(ConfigTx::new(5, 1, 1, 0));
        pools.insert_acc(AccTx::new([0u8; 32], [1u8; 32], 1));
        assert_eq!(pools.len(), 2);
        assert!(pools.remove(&hash));
        assert!(!pools.remove(&hash));
        assert_eq!(pools.len(), 1);
    }
}
