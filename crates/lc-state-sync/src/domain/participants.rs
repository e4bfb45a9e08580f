//! Participant filter carried by block headers.
//!
//! A Bloom filter over the address hashes of every account a block's funds
//! and account-creation transactions touch. Lets a light client skip blocks
//! that cannot affect an account without fetching their bodies.
//!
//! No false negatives: an inserted hash always tests positive.

use bitvec::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

use super::errors::Hash;

/// Target false positive rate for filters built by `HeaderBuilder`.
pub const DEFAULT_FILTER_FPR: f64 = 0.01;

/// Upper bound on hash functions accepted from the wire.
pub const MAX_HASH_FUNCTIONS: usize = 32;

/// Bloom filter of participant address hashes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFilter")]
pub struct ParticipantFilter {
    /// Bit array storing the filter state
    #[serde(serialize_with = "bitvec_serde::serialize")]
    bits: BitVec<u8, Lsb0>,
    /// Number of hash functions (k)
    k: usize,
}

/// Filter as received from a peer, before its shape is checked.
#[derive(Deserialize)]
struct RawFilter {
    #[serde(deserialize_with = "bitvec_serde::deserialize")]
    bits: BitVec<u8, Lsb0>,
    k: usize,
}

impl TryFrom<RawFilter> for ParticipantFilter {
    type Error = String;

    fn try_from(raw: RawFilter) -> Result<Self, Self::Error> {
        if raw.k == 0 || raw.k > MAX_HASH_FUNCTIONS {
            return Err(format!(
                "hash function count {} outside 1..={MAX_HASH_FUNCTIONS}",
                raw.k
            ));
        }
        Ok(Self {
            bits: raw.bits,
            k: raw.k,
        })
    }
}

/// Serde support for BitVec
mod bitvec_serde {
    use bitvec::prelude::*;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(bits: &BitVec<u8, Lsb0>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let bytes: Vec<u8> = bits.as_raw_slice().to_vec();
        (bytes, bits.len()).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BitVec<u8, Lsb0>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (bytes, len): (Vec<u8>, usize) = Deserialize::deserialize(deserializer)?;
        if len == 0 || len > bytes.len().saturating_mul(8) {
            return Err(serde::de::Error::custom(format!(
                "filter length {len} does not fit {} bytes",
                bytes.len()
            )));
        }
        let mut bits = BitVec::<u8, Lsb0>::from_vec(bytes);
        bits.truncate(len);
        Ok(bits)
    }
}

fn murmur_hash(element: &[u8], seed: u32) -> u64 {
    let mut cursor = Cursor::new(element);
    murmur3::murmur3_x64_128(&mut cursor, seed).unwrap_or(0) as u64
}

/// Double hashing: h(i) = h1 + i * h2
fn hash_positions(element: &[u8], k: usize, m: usize) -> impl Iterator<Item = usize> {
    let h1 = murmur_hash(element, 0);
    let h2 = murmur_hash(element, 1);
    (0..k).map(move |i| (h1.wrapping_add((i as u64).wrapping_mul(h2)) % m as u64) as usize)
}

impl ParticipantFilter {
    /// Filter with `m` bits and `k` hash functions.
    pub fn new(m: usize, k: usize) -> Self {
        Self {
            bits: bitvec![u8, Lsb0; 0; m.max(8)],
            k: k.clamp(1, MAX_HASH_FUNCTIONS),
        }
    }

    /// Filter sized for `expected` elements at `target_fpr`.
    ///
    /// m = -n ln(p) / ln(2)^2, k = m/n ln(2)
    pub fn with_capacity(expected: usize, target_fpr: f64) -> Self {
        let n = expected.max(1) as f64;
        let ln2 = std::f64::consts::LN_2;
        let m = (-(n * target_fpr.ln()) / (ln2 * ln2)).ceil() as usize;
        let k = ((m as f64 / n) * ln2).round() as usize;
        Self::new(m, k)
    }

    /// Record an address hash.
    pub fn insert(&mut self, address_hash: &Hash) {
        let m = self.bits.len();
        for pos in hash_positions(address_hash, self.k, m) {
            self.bits.set(pos, true);
        }
    }

    /// Whether the block may involve `address_hash`.
    ///
    /// A filter without bits rules nothing out.
    pub fn may_contain(&self, address_hash: &Hash) -> bool {
        let m = self.bits.len();
        if m == 0 {
            return true;
        }
        hash_positions(address_hash, self.k, m).all(|pos| self.bits[pos])
    }

    /// Raw bytes, folded into the header's content hash.
    pub fn as_bytes(&self) -> &[u8] {
        self.bits.as_raw_slice()
    }
}
