//! # Relevance Filter
//!
//! Selects the blocks that could change an account's derived state.
//! Conservative: a selected block may turn out irrelevant once its bodies
//! are fetched, but a relevant block is never skipped.

use std::sync::Arc;

use crate::domain::{BlockHeader, Hash};

/// Whether `header` could affect the account with `address_hash`.
///
/// A block is a candidate when the account produced it, when it changes
/// network parameters (replayed for every account, in order), or when it
/// carries funds or account-creation transactions that may involve the
/// account according to its participant filter. Headers without a filter
/// are selected whenever they carry such transactions.
pub fn is_relevant(header: &BlockHeader, address_hash: &Hash) -> bool {
    if header.beneficiary == *address_hash {
        return true;
    }
    if header.nr_config_tx > 0 || !header.config_tx_data.is_empty() {
        return true;
    }
    if header.funds_tx_data.is_empty() && header.acc_tx_data.is_empty() {
        return false;
    }
    match &header.participants {
        Some(filter) => filter.may_contain(address_hash),
        None => true,
    }
}

/// Candidate blocks for `address_hash`, in chain order.
pub fn relevant_blocks(headers: &[Arc<BlockHeader>], address_hash: &Hash) -> Vec<Arc<BlockHeader>> {
    headers
        .iter()
        .filter(|header| is_relevant(header, address_hash))
        .cloned()
        .collect()
}
