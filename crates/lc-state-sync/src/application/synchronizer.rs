//! # Header Synchronizer
//!
//! Keeps the local header chain in step with the network: a one-shot
//! catch-up walk from the network tip back to the local tip, then a
//! listener appending headers as they are broadcast.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::bridge::PeerBridge;
use crate::algorithms::{validate_header, validate_header_batch, BackwardWalk, WalkStep};
use crate::config::LightClientConfig;
use crate::domain::{
    short_hex, BlockHeader, Hash, LightClientError, SharedHeaderChain, SyncResult, ZERO_HASH,
};

/// Catch-up walk and streaming listener over one shared header chain.
#[derive(Clone)]
pub struct HeaderSynchronizer {
    bridge: Arc<PeerBridge>,
    chain: SharedHeaderChain,
    config: LightClientConfig,
    synced: Arc<AtomicBool>,
}

impl HeaderSynchronizer {
    /// Create a synchronizer appending to `chain`.
    pub fn new(bridge: Arc<PeerBridge>, chain: SharedHeaderChain, config: LightClientConfig) -> Self {
        Self {
            bridge,
            chain,
            config,
            synced: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a catch-up walk has completed.
    pub fn is_synced(&self) -> bool {
        self.synced.load(Ordering::SeqCst)
    }

    /// Walk from the network tip to the local tip and append what was found.
    ///
    /// # Errors
    /// - `TipUnavailable` if the tip cannot be fetched or fails its hash
    /// - `SyncStalled` if an ancestor stays unreachable
    /// - `ForkDetected` if the network chain does not extend the local one
    pub async fn catch_up(&self) -> Result<SyncResult, LightClientError> {
        let start = Instant::now();

        let delay = self.config.startup_delay();
        if !delay.is_zero() {
            debug!(delay_ms = self.config.startup_delay_ms, "Waiting for peer connections");
            tokio::time::sleep(delay).await;
        }

        let tip = self
            .bridge
            .request_block_header(None)
            .await
            .map_err(|e| LightClientError::TipUnavailable(e.to_string()))?;
        if !tip.has_valid_hash() {
            return Err(LightClientError::TipUnavailable(format!(
                "tip {} does not hash to its id",
                short_hex(&tip.hash)
            )));
        }
        info!(height = tip.height, hash = %short_hex(&tip.hash), "Network tip received");

        let appended = self.walk_from(tip).await?;
        self.synced.store(true, Ordering::SeqCst);

        let local_tip = self.chain.read().tip();
        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            headers = appended,
            height = local_tip.as_ref().map(|t| t.height),
            duration_ms,
            "Header chain synchronized"
        );
        Ok(SyncResult::new(appended, local_tip, duration_ms))
    }

    /// Append broadcast headers in arrival order until `incoming` closes.
    ///
    /// Failures are logged and the header dropped; the listener keeps
    /// running.
    pub fn spawn_listener(&self, mut incoming: mpsc::Receiver<BlockHeader>) -> JoinHandle<()> {
        let synchronizer = self.clone();
        tokio::spawn(async move {
            while let Some(header) = incoming.recv().await {
                let hash = header.hash;
                if let Err(e) = synchronizer.on_header(header).await {
                    warn!(hash = %short_hex(&hash), error = %e, "Dropping broadcast header");
                }
            }
            debug!("Header stream closed");
        })
    }

    /// Take one broadcast header. Returns the number of headers appended.
    ///
    /// A known header is ignored. One that does not extend the tip starts
    /// a backward walk from it to close the gap.
    pub async fn on_header(&self, header: BlockHeader) -> Result<u64, LightClientError> {
        validate_header(&header)?;

        {
            let mut chain = self.chain.write();
            if chain.contains(&header.hash) {
                debug!(hash = %short_hex(&header.hash), "Header already known");
                return Ok(0);
            }
            if chain.links_to_tip(&header) && (!chain.is_empty() || header.is_genesis()) {
                log_loaded(&header);
                chain.append(header)?;
                return Ok(1);
            }
        }

        debug!(
            height = header.height,
            hash = %short_hex(&header.hash),
            "Header does not extend tip, filling gap"
        );
        self.walk_from(header).await
    }

    async fn walk_from(&self, newest: BlockHeader) -> Result<u64, LightClientError> {
        let (last_known, newest_known) = {
            let chain = self.chain.read();
            (chain.tip_hash().unwrap_or(ZERO_HASH), chain.contains(&newest.hash))
        };

        let mut walk = BackwardWalk::new(last_known, self.config.max_walk_depth);
        let mut step = walk.push(newest, newest_known)?;
        while let WalkStep::Need(hash) = step {
            let header = self.load_ancestor(hash).await?;
            let known = self.chain.read().contains(&header.hash);
            step = walk.push(header, known)?;
        }

        let headers = walk.finish();
        if headers.is_empty() {
            return Ok(0);
        }
        validate_header_batch(&headers)?;
        headers.iter().for_each(log_loaded);
        self.chain.write().append_batch(headers)
    }

    async fn load_ancestor(&self, hash: Hash) -> Result<BlockHeader, LightClientError> {
        let attempts = self.config.max_ancestor_retries;
        for attempt in 1..=attempts {
            match self.bridge.request_block_header(Some(hash)).await {
                Ok(header) if header.has_valid_hash() => return Ok(header),
                Ok(_) => warn!(
                    hash = %short_hex(&hash),
                    attempt,
                    "Ancestor does not hash to its id"
                ),
                Err(e) => warn!(
                    error = %LightClientError::MissingAncestor(hash),
                    cause = %e,
                    attempt,
                    "Ancestor fetch failed"
                ),
            }
            if attempt < attempts {
                tokio::time::sleep(self.config.retry_backoff()).await;
            }
        }
        Err(LightClientError::SyncStalled { hash, attempts })
    }
}

fn log_loaded(header: &BlockHeader) {
    debug!(
        height = header.height,
        hash = %short_hex(&header.hash),
        funds = header.nr_funds_tx,
        acc = header.nr_acc_tx,
        config = header.nr_config_tx,
        stake = header.nr_stake_tx,
        "Loaded block header"
    );
}
