//! # Domain Module
//!
//! Core domain types for header sync and account state reconstruction.

pub mod entities;
pub mod errors;
pub mod hashing;
pub mod invariants;
pub mod messages;
pub mod parameters;
pub mod participants;
pub mod pending;
pub mod transactions;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use hashing::*;
pub use invariants::*;
pub use messages::*;
pub use parameters::*;
pub use participants::*;
pub use pending::*;
pub use transactions::*;
pub use value_objects::*;
