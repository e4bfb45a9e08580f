//! # Algorithms Module
//!
//! Synchronous building blocks: the backward header walk, the relevance
//! filter, replay effects and Merkle proofs.

pub mod header_sync;
pub mod merkle_verifier;
pub mod relevance;
pub mod replay;

pub use header_sync::{validate_header, validate_header_batch, BackwardWalk, WalkStep};
pub use merkle_verifier::{build_merkle_proof, compute_merkle_root, merkle_path_for, verify_merkle_proof};
pub use relevance::{is_relevant, relevant_blocks};
pub use replay::ReplayState;
