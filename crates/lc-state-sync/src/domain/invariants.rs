//! # Domain Invariants
//!
//! Rules that must hold for any header list a light client exposes.

use std::collections::HashSet;
use std::ops::Deref;

use super::entities::BlockHeader;
use super::errors::{short_hex, LightClientError};

/// Invariant: every header's parent is its predecessor in the list.
pub fn invariant_header_chain_continuous<H>(headers: &[H]) -> Result<(), LightClientError>
where
    H: Deref<Target = BlockHeader>,
{
    for (i, window) in headers.windows(2).enumerate() {
        let (prev, curr) = (&window[0], &window[1]);
        if curr.prev_hash != prev.hash {
            return Err(LightClientError::InvalidHeaderChain(format!(
                "Parent hash mismatch at index {}: expected {}, got {}",
                i + 1,
                short_hex(&prev.hash),
                short_hex(&curr.prev_hash)
            )));
        }
    }
    Ok(())
}

/// Invariant: no header appears twice.
pub fn invariant_no_duplicate_headers<H>(headers: &[H]) -> Result<(), LightClientError>
where
    H: Deref<Target = BlockHeader>,
{
    let mut seen = HashSet::with_capacity(headers.len());
    for header in headers {
        if !seen.insert(header.hash) {
            return Err(LightClientError::InvalidHeaderChain(format!(
                "Duplicate header {}",
                short_hex(&header.hash)
            )));
        }
    }
    Ok(())
}
