//! # Header Sync
//!
//! Backward walk from a newly learned header to the local tip, kept as an
//! explicit work list so chain length never turns into call depth.

use crate::domain::{short_hex, BlockHeader, Hash, LightClientError, ZERO_HASH};

/// What the walk needs next.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WalkStep {
    /// Fetch the header with this hash and push it.
    Need(Hash),
    /// The walk joined the local chain (or reached genesis).
    Done,
}

/// Headers discovered newest first, handed back oldest first.
#[derive(Debug)]
pub struct BackwardWalk {
    last_known: Hash,
    max_depth: usize,
    discovered: Vec<BlockHeader>,
}

impl BackwardWalk {
    /// Walk that stops at `last_known` (`ZERO_HASH` for an empty chain).
    pub fn new(last_known: Hash, max_depth: usize) -> Self {
        Self {
            last_known,
            max_depth,
            discovered: Vec::new(),
        }
    }

    /// Feed the next header, newest first.
    ///
    /// `known_locally` tells whether the local chain already holds this
    /// header; one that is known but is not the tip means the remote chain
    /// branched off below our tip.
    ///
    /// # Errors
    /// - `InvalidHeaderChain` if the header is not the awaited ancestor
    /// - `ForkDetected` if genesis or a known non-tip header is reached
    ///   while the local chain is not empty
    /// - `InvalidHeaderChain` if the walk exceeds its maximum depth
    pub fn push(&mut self, header: BlockHeader, known_locally: bool) -> Result<WalkStep, LightClientError> {
        if let Some(child) = self.discovered.last() {
            if child.prev_hash != header.hash {
                return Err(LightClientError::InvalidHeaderChain(format!(
                    "Expected ancestor {}, got {}",
                    short_hex(&child.prev_hash),
                    short_hex(&header.hash)
                )));
            }
        }

        if header.hash == self.last_known {
            return Ok(WalkStep::Done);
        }
        if known_locally {
            return Err(LightClientError::ForkDetected);
        }

        let next = header.prev_hash;
        let genesis = header.is_genesis();
        self.discovered.push(header);

        if genesis {
            if self.last_known != ZERO_HASH {
                return Err(LightClientError::ForkDetected);
            }
            return Ok(WalkStep::Done);
        }
        if self.discovered.len() >= self.max_depth {
            return Err(LightClientError::InvalidHeaderChain(format!(
                "Backward walk exceeded {} headers",
                self.max_depth
            )));
        }
        Ok(WalkStep::Need(next))
    }

    /// Number of headers discovered so far.
    pub fn len(&self) -> usize {
        self.discovered.len()
    }

    /// Check if nothing was discovered.
    pub fn is_empty(&self) -> bool {
        self.discovered.is_empty()
    }

    /// Discovered headers, oldest first.
    pub fn finish(self) -> Vec<BlockHeader> {
        let mut headers = self.discovered;
        headers.reverse();
        headers
    }
}

/// Check one header in isolation: content hash and per-kind counts.
pub fn validate_header(header: &BlockHeader) -> Result<(), LightClientError> {
    if !header.has_valid_hash() {
        return Err(LightClientError::InvalidHeader(format!(
            "Content of {} does not hash to its id",
            short_hex(&header.hash)
        )));
    }
    if !header.counts_consistent() {
        return Err(LightClientError::InvalidHeader(format!(
            "Transaction counts of {} disagree with its hash lists",
            short_hex(&header.hash)
        )));
    }
    Ok(())
}

/// Validate a batch of headers before appending it.
///
/// # Checks
/// 1. Every header passes [`validate_header`]
/// 2. Parent hash continuity
pub fn validate_header_batch(headers: &[BlockHeader]) -> Result<(), LightClientError> {
    headers.iter().try_for_each(validate_header)?;

    for window in headers.windows(2) {
        if window[1].prev_hash != window[0].hash {
            return Err(LightClientError::InvalidHeaderChain(format!(
                "Broken chain at height {}",
                window[1].height
            )));
        }
    }

    Ok(())
}
