//! # Peer Bridge
//!
//! Request/fetch contract over the peer layer. Requests go to one peer
//! chosen at random; responses come back through a [`ResponseRouter`] into
//! one bounded queue per [`ResponseChannel`].
//!
//! A plain `fetch` takes the next response on a channel, whatever request
//! it answers. `exchange` holds the channel for the whole round trip and
//! discards responses that do not answer its own request.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::time::{timeout_at, Duration, Instant};
use tracing::{debug, warn};

use crate::config::LightClientConfig;
use crate::domain::{
    Account, BlockHeader, Hash, LightClientError, ProofNode, Request, Response, ResponseChannel,
    Transaction, TxKind,
};
use crate::ports::PeerPool;

/// Client half of the peer bridge.
pub struct PeerBridge {
    pool: Arc<dyn PeerPool>,
    receivers: HashMap<ResponseChannel, Mutex<mpsc::Receiver<Response>>>,
    fetch_timeout: Duration,
}

/// Transport half of the peer bridge: routes responses to their channel.
#[derive(Clone, Debug)]
pub struct ResponseRouter {
    senders: HashMap<ResponseChannel, mpsc::Sender<Response>>,
}

impl PeerBridge {
    /// Create a bridge over `pool` and the router its transport delivers to.
    pub fn new(pool: Arc<dyn PeerPool>, config: &LightClientConfig) -> (Self, ResponseRouter) {
        let mut senders = HashMap::new();
        let mut receivers = HashMap::new();
        for channel in ResponseChannel::ALL {
            let (tx, rx) = mpsc::channel(config.response_channel_capacity.max(1));
            senders.insert(channel, tx);
            receivers.insert(channel, Mutex::new(rx));
        }

        let bridge = Self {
            pool,
            receivers,
            fetch_timeout: config.fetch_timeout(),
        };
        (bridge, ResponseRouter { senders })
    }

    /// Number of peers requests can go to.
    pub fn peer_count(&self) -> usize {
        self.pool.peer_count()
    }

    /// Send `request` to a random peer.
    ///
    /// # Errors
    /// - `NoPeerAvailable` if the pool is empty (returned immediately)
    /// - whatever the peer connection reports
    pub async fn request(&self, request: Request) -> Result<(), LightClientError> {
        let peer = self
            .pool
            .random_peer()
            .ok_or(LightClientError::NoPeerAvailable)?;
        debug!(peer = peer.peer_id(), %request, "Sending request");
        peer.send(request).await
    }

    /// Next response on `channel`.
    ///
    /// # Errors
    /// - `FetchTimeout` if nothing arrives within the fetch timeout
    /// - `Disconnected` if the transport side is gone
    pub async fn fetch(&self, channel: ResponseChannel) -> Result<Response, LightClientError> {
        let mut rx = self.receiver(channel)?.lock().await;
        let deadline = Instant::now() + self.fetch_timeout;
        Self::recv_until(&mut rx, channel, deadline).await
    }

    /// Send `request` and wait for a response `accept` maps to a value.
    ///
    /// The channel stays locked for the round trip, so concurrent
    /// exchanges on one channel are serialized. Leftovers of earlier
    /// timed-out exchanges and responses `accept` rejects are dropped.
    pub async fn exchange<T, F>(&self, request: Request, mut accept: F) -> Result<T, LightClientError>
    where
        F: FnMut(Response) -> Option<T> + Send,
        T: Send,
    {
        let channel = request.channel();
        let mut rx = self.receiver(channel)?.lock().await;

        while let Ok(stale) = rx.try_recv() {
            debug!(%channel, response = %stale.describe(), "Dropping stale response");
        }

        self.request(request).await?;

        let deadline = Instant::now() + self.fetch_timeout;
        loop {
            let response = Self::recv_until(&mut rx, channel, deadline).await?;
            let got = response.describe();
            match accept(response) {
                Some(value) => return Ok(value),
                None => warn!(%channel, response = %got, "Discarding uncorrelated response"),
            }
        }
    }

    /// Header with `hash`, or the peer's tip for `None`.
    pub async fn request_block_header(&self, hash: Option<Hash>) -> Result<BlockHeader, LightClientError> {
        self.exchange(Request::BlockHeader(hash), |response| match response {
            Response::BlockHeader(header) if hash.map_or(true, |want| header.hash == want) => {
                Some(header)
            }
            _ => None,
        })
        .await
    }

    /// Body of the `kind` transaction whose content hashes to `hash`.
    pub async fn request_transaction(&self, kind: TxKind, hash: Hash) -> Result<Transaction, LightClientError> {
        self.exchange(Request::Transaction { kind, hash }, |response| match response {
            Response::Transaction(tx) if tx.kind() == kind && tx.hash() == hash => Some(tx),
            _ => None,
        })
        .await
    }

    /// Merkle path of `tx_hash` inside the block `block_hash`.
    pub async fn request_intermediate_nodes(
        &self,
        block_hash: Hash,
        tx_hash: Hash,
    ) -> Result<Vec<ProofNode>, LightClientError> {
        let request = Request::IntermediateNodes {
            block_hash,
            tx_hash,
        };
        self.exchange(request, |response| match response {
            Response::IntermediateNodes {
                block_hash: b,
                tx_hash: t,
                path,
            } if b == block_hash && t == tx_hash => Some(path),
            _ => None,
        })
        .await
    }

    /// Account record of `address_hash` among root (`root`) or ordinary
    /// accounts. `None` when the peer knows no such account.
    pub async fn request_account(
        &self,
        root: bool,
        address_hash: Hash,
    ) -> Result<Option<Account>, LightClientError> {
        let request = Request::Account { root, address_hash };
        self.exchange(request, |response| match response {
            Response::Account {
                root: r,
                address_hash: a,
                account,
            } if r == root
                && a == address_hash
                && account.as_ref().map_or(true, |acc| acc.address_hash == address_hash) =>
            {
                Some(account)
            }
            _ => None,
        })
        .await
    }

    /// Whether a peer knows `address_hash` as a root account.
    pub async fn is_root_account(&self, address_hash: Hash) -> Result<bool, LightClientError> {
        let record = self.request_account(true, address_hash).await?;
        Ok(record.map_or(false, |account| account.is_root))
    }

    fn receiver(&self, channel: ResponseChannel) -> Result<&Mutex<mpsc::Receiver<Response>>, LightClientError> {
        self.receivers
            .get(&channel)
            .ok_or_else(|| LightClientError::Disconnected(format!("no {channel} channel")))
    }

    async fn recv_until(
        rx: &mut mpsc::Receiver<Response>,
        channel: ResponseChannel,
        deadline: Instant,
    ) -> Result<Response, LightClientError> {
        match timeout_at(deadline, rx.recv()).await {
            Ok(Some(response)) => Ok(response),
            Ok(None) => Err(LightClientError::Disconnected(format!(
                "{channel} channel closed"
            ))),
            Err(_) => Err(LightClientError::FetchTimeout { channel }),
        }
    }
}

impl ResponseRouter {
    /// Queue `response` on its channel.
    ///
    /// # Errors
    /// - `NetworkError` if the channel's buffer is full (response dropped)
    /// - `Disconnected` if the bridge is gone
    pub fn deliver(&self, response: Response) -> Result<(), LightClientError> {
        let channel = response.channel();
        let sender = self
            .senders
            .get(&channel)
            .ok_or_else(|| LightClientError::Disconnected(format!("no {channel} channel")))?;
        sender.try_send(response).map_err(|e| match e {
            mpsc::error::TrySendError::Full(dropped) => {
                warn!(%channel, response = %dropped.describe(), "Response buffer full");
                LightClientError::NetworkError(format!("{channel} buffer full"))
            }
            mpsc::error::TrySendError::Closed(_) => {
                LightClientError::Disconnected(format!("{channel} channel closed"))
            }
        })
    }
}
