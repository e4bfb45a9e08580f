//! # Light Client Configuration
//!
//! Timeouts, retry policy and buffer sizes for the light client.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::{LightClientError, DEFAULT_RECENT_TX_CAPACITY};

/// Light client configuration.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LightClientConfig {
    /// How long a fetch waits for a response before giving up.
    pub fetch_timeout_ms: u64,

    /// Attempts per missing ancestor before the walk stalls.
    pub max_ancestor_retries: u32,

    /// Pause between ancestor retries.
    pub retry_backoff_ms: u64,

    /// Maximum headers discovered by a single backward walk.
    pub max_walk_depth: usize,

    /// Wait before the catch-up walk so peer connections can establish.
    pub startup_delay_ms: u64,

    /// Buffered responses per response channel.
    pub response_channel_capacity: usize,

    /// Buffered headers on the streaming channel.
    pub header_stream_capacity: usize,

    /// Entries kept in a recent-transaction log.
    pub recent_tx_capacity: usize,

    /// Transaction bodies kept in the fetch cache.
    pub tx_cache_size: usize,

    /// Verify Merkle inclusion of every replayed transaction.
    pub verify_inclusion_proofs: bool,
}

impl Default for LightClientConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_ms: 5_000,
            max_ancestor_retries: 5,
            retry_backoff_ms: 500,
            max_walk_depth: 1_000_000,
            startup_delay_ms: 10_000,
            response_channel_capacity: 64,
            header_stream_capacity: 256,
            recent_tx_capacity: DEFAULT_RECENT_TX_CAPACITY,
            tx_cache_size: 1_000,
            verify_inclusion_proofs: true,
        }
    }
}

impl LightClientConfig {
    /// Create a config for testing (short timeouts, no startup delay).
    pub fn for_testing() -> Self {
        Self {
            fetch_timeout_ms: 200,
            max_ancestor_retries: 3,
            retry_backoff_ms: 10,
            max_walk_depth: 10_000,
            startup_delay_ms: 0,
            response_channel_capacity: 16,
            header_stream_capacity: 16,
            recent_tx_capacity: DEFAULT_RECENT_TX_CAPACITY,
            tx_cache_size: 100,
            verify_inclusion_proofs: true,
        }
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), LightClientError> {
        if self.fetch_timeout_ms == 0 {
            return Err(LightClientError::InvalidConfig(
                "fetch_timeout_ms must be positive".to_string(),
            ));
        }
        if self.max_ancestor_retries == 0 {
            return Err(LightClientError::InvalidConfig(
                "max_ancestor_retries must be at least 1".to_string(),
            ));
        }
        if self.max_walk_depth == 0 {
            return Err(LightClientError::InvalidConfig(
                "max_walk_depth must be positive".to_string(),
            ));
        }
        if self.response_channel_capacity == 0 || self.header_stream_capacity == 0 {
            return Err(LightClientError::InvalidConfig(
                "channel capacities must be positive".to_string(),
            ));
        }
        if self.tx_cache_size == 0 {
            return Err(LightClientError::InvalidConfig(
                "tx_cache_size must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Fetch timeout as a `Duration`.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Retry backoff as a `Duration`.
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// Startup delay as a `Duration`.
    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }
}
