//! Static Peer Pool Adapter
//!
//! Implements `PeerPool` over a fixed, manually maintained set of
//! connections.

use parking_lot::RwLock;
use rand::seq::SliceRandom;
use std::sync::Arc;
use tracing::{debug, info};

use crate::ports::{PeerConnection, PeerPool};

/// Peer pool that only changes through `add_peer` and `remove_peer`.
#[derive(Default)]
pub struct StaticPeerPool {
    peers: RwLock<Vec<Arc<dyn PeerConnection>>>,
}

impl StaticPeerPool {
    /// Empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection. A connection with the same id is replaced.
    pub fn add_peer(&self, peer: Arc<dyn PeerConnection>) {
        let mut peers = self.peers.write();
        peers.retain(|p| p.peer_id() != peer.peer_id());
        info!(peer = peer.peer_id(), "Peer added");
        peers.push(peer);
    }

    /// Drop the connection with `peer_id`. Returns whether it was present.
    pub fn remove_peer(&self, peer_id: &str) -> bool {
        let mut peers = self.peers.write();
        let before = peers.len();
        peers.retain(|p| p.peer_id() != peer_id);
        let removed = peers.len() < before;
        if removed {
            debug!(peer = peer_id, "Peer removed");
        }
        removed
    }
}

impl PeerPool for StaticPeerPool {
    fn random_peer(&self) -> Option<Arc<dyn PeerConnection>> {
        self.peers.read().choose(&mut rand::thread_rng()).cloned()
    }

    fn peer_count(&self) -> usize {
        self.peers.read().len()
    }
}
