//! # Light Client Node
//!
//! Runs the light client engine against an in-process full node.
//!
//! ## Startup Sequence
//!
//! 1. Install logging (`RUST_LOG`, default `info`)
//! 2. Load configuration (`LC_CONFIG` JSON file, then `LC_*` overrides)
//! 3. Seed a demo network, catch up and start the header listener
//! 4. Reconstruct the account in `LC_ACCOUNT` before and after new blocks

mod demo;

use anyhow::{bail, Context, Result};
use std::str::FromStr;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use lc_state_sync::{Address, LightClientConfig};

/// Account reconstructed when `LC_ACCOUNT` is not set.
const DEFAULT_ACCOUNT: Address = [0xA1; 32];

fn load_config() -> Result<LightClientConfig> {
    let mut config = match std::env::var("LC_CONFIG") {
        Ok(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config file {path}"))?;
            let config: LightClientConfig = serde_json::from_str(&raw)
                .with_context(|| format!("parsing config file {path}"))?;
            info!(%path, "Loaded configuration file");
            config
        }
        Err(_) => LightClientConfig::default(),
    };

    override_from_env("LC_FETCH_TIMEOUT_MS", &mut config.fetch_timeout_ms);
    override_from_env("LC_MAX_ANCESTOR_RETRIES", &mut config.max_ancestor_retries);
    override_from_env("LC_RETRY_BACKOFF_MS", &mut config.retry_backoff_ms);
    override_from_env("LC_STARTUP_DELAY_MS", &mut config.startup_delay_ms);
    override_from_env("LC_TX_CACHE_SIZE", &mut config.tx_cache_size);
    override_from_env("LC_VERIFY_PROOFS", &mut config.verify_inclusion_proofs);

    config.validate()?;
    Ok(config)
}

fn override_from_env<T: FromStr>(name: &str, slot: &mut T) {
    if let Ok(raw) = std::env::var(name) {
        match raw.parse() {
            Ok(value) => *slot = value,
            Err(_) => warn!(var = name, value = %raw, "Ignoring unparsable override"),
        }
    }
}

fn load_account() -> Result<Address> {
    let Ok(raw) = std::env::var("LC_ACCOUNT") else {
        return Ok(DEFAULT_ACCOUNT);
    };
    let bytes = hex::decode(raw.trim()).context("LC_ACCOUNT must be hex")?;
    let Ok(address) = Address::try_from(bytes.as_slice()) else {
        bail!("LC_ACCOUNT must be 32 bytes (64 hex chars), got {}", bytes.len());
    };
    Ok(address)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config()?;
    let account = load_account()?;
    info!(account = %hex::encode(account), "Starting light client");

    demo::run(config, account).await
}
