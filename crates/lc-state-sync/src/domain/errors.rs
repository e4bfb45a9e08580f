//! # Domain Errors
//!
//! Error types for header sync and account state reconstruction.

use thiserror::Error;

use super::messages::ResponseChannel;

/// Hash type alias (32-byte SHA-256)
pub type Hash = [u8; 32];

/// The empty hash. As a `prev_hash` it marks the genesis block.
pub const ZERO_HASH: Hash = [0u8; 32];

/// Short hex prefix of a hash for log and error messages.
pub fn short_hex(hash: &Hash) -> String {
    hex::encode(&hash[..8])
}

/// Light client error types.
#[derive(Debug, Error)]
pub enum LightClientError {
    /// No peer connection to send a request on.
    #[error("Couldn't get a connection, request not transmitted")]
    NoPeerAvailable,

    /// The peer did not answer before the fetch deadline.
    #[error("Timed out waiting for a response on the {channel} channel")]
    FetchTimeout {
        /// Channel the fetch was waiting on
        channel: ResponseChannel,
    },

    /// The connection or response channel was closed.
    #[error("Disconnected: {0}")]
    Disconnected(String),

    /// A response arrived that cannot answer the request.
    #[error("Unexpected response: expected {expected}, got {got}")]
    UnexpectedResponse {
        /// What the caller asked for
        expected: String,
        /// What arrived instead
        got: String,
    },

    /// A fetched transaction failed validation against its block.
    #[error("Validation of tx {} failed: {reason}", short_hex(.tx_hash))]
    ValidationFailed {
        /// Hash of the rejected transaction
        tx_hash: Hash,
        /// Validator's reason
        reason: String,
    },

    /// An ancestor header could not be fetched.
    #[error("Missing ancestor header {}", short_hex(.0))]
    MissingAncestor(Hash),

    /// The backward walk could not make progress.
    #[error("Header sync stalled at {} after {attempts} attempts", short_hex(.hash))]
    SyncStalled {
        /// Ancestor hash that could not be loaded
        hash: Hash,
        /// Attempts made before giving up
        attempts: u32,
    },

    /// The network head could not be fetched. Fatal for catch-up.
    #[error("Network tip unavailable: {0}")]
    TipUnavailable(String),

    /// The remote chain does not contain the local tip.
    #[error("Header chain fork detected")]
    ForkDetected,

    /// Invalid header chain (broken parent link or duplicate).
    #[error("Invalid header chain: {0}")]
    InvalidHeaderChain(String),

    /// Invalid block header.
    #[error("Invalid block header: {0}")]
    InvalidHeader(String),

    /// Crediting would overflow the balance.
    #[error("Balance overflow crediting {amount}")]
    BalanceOverflow {
        /// Amount that could not be credited
        amount: u64,
    },

    /// Debiting would take the balance below zero.
    #[error("Balance underflow: debit {needed} exceeds balance {available}")]
    BalanceUnderflow {
        /// Amount to debit
        needed: u64,
        /// Balance at the time of the debit
        available: u64,
    },

    /// Configuration rejected by `LightClientConfig::validate`.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Network error while talking to a peer.
    #[error("Network error: {0}")]
    NetworkError(String),
}

impl LightClientError {
    /// Shorthand for a validation failure.
    pub fn validation(tx_hash: Hash, reason: impl Into<String>) -> Self {
        Self::ValidationFailed {
            tx_hash,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_peer_error() {
        let err = LightClientError::NoPeerAvailable;
        assert!(err.to_string().contains("connection"));
    }

    #[test]
    fn test_fetch_timeout_names_channel() {
        let err = LightClientError::FetchTimeout {
            channel: ResponseChannel::FundsTx,
        };
        assert!(err.to_string().contains("funds-tx"));
    }

    #[test]
    fn test_sync_stalled_error() {
        let err = LightClientError::SyncStalled {
            hash: [0xab; 32],
            attempts: 4,
        };
        let msg = err.to_string();
        assert!(msg.contains("abababab"));
        assert!(msg.contains("4 attempts"));
    }

    #[test]
    fn test_validation_error() {
        let err = LightClientError::validation([1u8; 32], "bad proof");
        assert!(err.to_string().contains("bad proof"));
    }

    #[test]
    fn test_underflow_error() {
        let err = LightClientError::BalanceUnderflow {
            needed: 11,
            available: 3,
        };
        assert!(err.to_string().contains("11"));
    }
}
