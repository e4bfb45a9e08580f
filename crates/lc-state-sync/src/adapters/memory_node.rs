//! In-Memory Full Node Adapter
//!
//! Implements `PeerConnection` for a full node living in the same process.
//! Answers requests from its own block store and delivers the answers
//! through a `ResponseRouter`. Used by the demo binary and by tests.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::algorithms::merkle_path_for;
use crate::application::ResponseRouter;
use crate::domain::{
    short_hex, Account, BlockHeader, Hash, LightClientError, ProofNode, Request, Response,
    Transaction,
};
use crate::ports::PeerConnection;

#[derive(Default)]
struct NodeStore {
    headers: HashMap<Hash, BlockHeader>,
    txs: HashMap<Hash, Transaction>,
    accounts: HashMap<Hash, Account>,
    tip: Option<Hash>,
    unreachable: HashSet<Hash>,
    subscribers: Vec<mpsc::Sender<BlockHeader>>,
}

/// Full node holding blocks in memory.
pub struct MemoryFullNode {
    id: String,
    router: ResponseRouter,
    store: RwLock<NodeStore>,
    offline: AtomicBool,
    corrupt_proofs: AtomicBool,
}

impl MemoryFullNode {
    /// Create a node answering through `router`.
    pub fn new(id: impl Into<String>, router: ResponseRouter) -> Self {
        Self {
            id: id.into(),
            router,
            store: RwLock::new(NodeStore::default()),
            offline: AtomicBool::new(false),
            corrupt_proofs: AtomicBool::new(false),
        }
    }

    /// Add a block with its transaction bodies and make it the tip.
    ///
    /// The header is also broadcast to subscribers; a full subscriber
    /// misses it.
    pub fn publish_block(&self, header: BlockHeader, txs: Vec<Transaction>) {
        let mut store = self.store.write();
        for tx in txs {
            store.txs.insert(tx.hash(), tx);
        }
        store.tip = Some(header.hash);
        store.subscribers.retain(|sub| match sub.try_send(header.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(hash = %short_hex(&header.hash), "Subscriber lagging, broadcast dropped");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
        debug!(node = %self.id, height = header.height, "Published block");
        store.headers.insert(header.hash, header);
    }

    /// Make `account` answerable to account requests.
    pub fn register_account(&self, account: Account) {
        self.store.write().accounts.insert(account.address_hash, account);
    }

    /// Stream of headers published from now on.
    pub fn subscribe(&self, capacity: usize) -> mpsc::Receiver<BlockHeader> {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        self.store.write().subscribers.push(tx);
        rx
    }

    /// Refuse requests for the header `hash`.
    pub fn mark_unreachable(&self, hash: Hash) {
        self.store.write().unreachable.insert(hash);
    }

    /// Serve the header `hash` again.
    pub fn mark_reachable(&self, hash: &Hash) {
        self.store.write().unreachable.remove(hash);
    }

    /// Refuse every request while set.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Answer intermediate-node requests with a wrong path while set.
    pub fn set_corrupt_proofs(&self, corrupt: bool) {
        self.corrupt_proofs.store(corrupt, Ordering::SeqCst);
    }

    fn answer(&self, request: &Request) -> Result<Response, LightClientError> {
        let store = self.store.read();
        match request {
            Request::BlockHeader(None) => store
                .tip
                .and_then(|tip| store.headers.get(&tip))
                .cloned()
                .map(Response::BlockHeader)
                .ok_or_else(|| LightClientError::NetworkError(format!("{} has no blocks", self.id))),
            Request::BlockHeader(Some(hash)) => {
                if store.unreachable.contains(hash) {
                    return Err(LightClientError::NetworkError(format!(
                        "header {} unreachable",
                        short_hex(hash)
                    )));
                }
                store
                    .headers
                    .get(hash)
                    .cloned()
                    .map(Response::BlockHeader)
                    .ok_or_else(|| unknown("header", hash))
            }
            Request::Transaction { kind, hash } => store
                .txs
                .get(hash)
                .filter(|tx| tx.kind() == *kind)
                .cloned()
                .map(Response::Transaction)
                .ok_or_else(|| unknown("transaction", hash)),
            Request::IntermediateNodes {
                block_hash,
                tx_hash,
            } => {
                let header = store
                    .headers
                    .get(block_hash)
                    .ok_or_else(|| unknown("block", block_hash))?;
                let mut path =
                    merkle_path_for(header, tx_hash).ok_or_else(|| unknown("transaction", tx_hash))?;
                if self.corrupt_proofs.load(Ordering::SeqCst) {
                    path.reverse();
                    path.push(ProofNode::right(*block_hash));
                }
                Ok(Response::IntermediateNodes {
                    block_hash: *block_hash,
                    tx_hash: *tx_hash,
                    path,
                })
            }
            Request::Account { root, address_hash } => Ok(Response::Account {
                root: *root,
                address_hash: *address_hash,
                account: store
                    .accounts
                    .get(address_hash)
                    .filter(|account| account.is_root == *root)
                    .cloned(),
            }),
        }
    }
}

fn unknown(what: &str, hash: &Hash) -> LightClientError {
    LightClientError::NetworkError(format!("unknown {what} {}", short_hex(hash)))
}

#[async_trait]
impl PeerConnection for MemoryFullNode {
    fn peer_id(&self) -> &str {
        &self.id
    }

    async fn send(&self, request: Request) -> Result<(), LightClientError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(LightClientError::Disconnected(format!("{} is offline", self.id)));
        }
        let response = self.answer(&request)?;
        self.router.deliver(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::StaticPeerPool;
    use crate::application::PeerBridge;
    use crate::config::LightClientConfig;
    use crate::domain::{address_hash, HeaderBuilder, ResponseChannel, ZERO_HASH};
    use std::sync::Arc;

    fn node() -> (Arc<MemoryFullNode>, PeerBridge) {
        let pool = Arc::new(StaticPeerPool::new());
        let (bridge, router) = PeerBridge::new(pool.clone(), &LightClientConfig::for_testing());
        let node = Arc::new(MemoryFullNode::new("memory", router));
        pool.add_peer(node.clone());
        (node, bridge)
    }

    #[tokio::test]
    async fn test_empty_node_has_no_tip() {
        let (node, _bridge) = node();
        assert!(node.send(Request::BlockHeader(None)).await.is_err());
    }

    #[tokio::test]
    async fn test_offline_node_refuses() {
        let (node, _bridge) = node();
        node.publish_block(HeaderBuilder::new(ZERO_HASH, 0).build(), vec![]);
        node.set_offline(true);
        assert!(matches!(
            node.send(Request::BlockHeader(None)).await,
            Err(LightClientError::Disconnected(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_then_reachable() {
        let (node, bridge) = node();
        let genesis = HeaderBuilder::new(ZERO_HASH, 0).build();
        node.publish_block(genesis.clone(), vec![]);
        node.mark_unreachable(genesis.hash);
        assert!(node.send(Request::BlockHeader(Some(genesis.hash))).await.is_err());

        node.mark_reachable(&genesis.hash);
        node.send(Request::BlockHeader(Some(genesis.hash))).await.unwrap();
        let response = bridge.fetch(ResponseChannel::BlockHeader).await.unwrap();
        assert_eq!(response, Response::BlockHeader(genesis));
    }

    #[tokio::test]
    async fn test_subscribers_receive_published_headers() {
        let (node, _bridge) = node();
        let mut headers = node.subscribe(4);
        let genesis = HeaderBuilder::new(ZERO_HASH, 0).build();
        node.publish_block(genesis.clone(), vec![]);
        assert_eq!(headers.recv().await, Some(genesis));
    }

    #[tokio::test]
    async fn test_account_lookup_respects_kind() {
        let (node, bridge) = node();
        node.register_account(Account::new([4u8; 32]));
        let hash = address_hash(&[4u8; 32]);

        node.send(Request::Account { root: true, address_hash: hash }).await.unwrap();
        let response = bridge.fetch(ResponseChannel::Account).await.unwrap();
        assert!(matches!(response, Response::Account { account: None, .. }));

        node.send(Request::Account { root: false, address_hash: hash }).await.unwrap();
        let response = bridge.fetch(ResponseChannel::Account).await.unwrap();
        assert!(matches!(response, Response::Account { account: Some(_), .. }));
    }
}
