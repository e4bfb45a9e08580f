//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements outbound port traits: an in-process full node, a static peer
//! pool, transaction validators and the parameter update rule.

mod memory_node;
mod parameters;
mod peer_pool;
mod validator;

pub use memory_node::MemoryFullNode;
pub use parameters::BoundedParameterRule;
pub use peer_pool::StaticPeerPool;
pub use validator::{MerkleInclusionValidator, StructuralValidator};
