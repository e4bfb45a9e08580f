//! # Application Module
//!
//! Application services orchestrating the domain and outbound ports.

pub mod bridge;
pub mod reconstructor;
pub mod service;
pub mod synchronizer;

pub use bridge::{PeerBridge, ResponseRouter};
pub use reconstructor::StateReconstructor;
pub use service::LightClientService;
pub use synchronizer::HeaderSynchronizer;
