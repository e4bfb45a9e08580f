//! Content hashing shared by headers, transactions and accounts.

use sha2::{Digest, Sha256};

use super::errors::Hash;

/// Address type alias (32-byte public key).
pub type Address = [u8; 32];

/// SHA-256 over the concatenation of `parts`.
pub fn hash_content(parts: &[&[u8]]) -> Hash {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Digest identifying an account in blocks and transactions.
pub fn address_hash(address: &Address) -> Hash {
    hash_content(&[address])
}
