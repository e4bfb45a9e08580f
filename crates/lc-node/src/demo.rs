//! Demo network: one in-process full node with a short history involving
//! the configured account, then two blocks broadcast after catch-up.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use lc_state_sync::{
    address_hash, AccTx, Account, Address, BlockHeader, ConfigTx, FundsTx, HeaderBuilder,
    LightClientApi, LightClientConfig, LightClientService, MemoryFullNode, RecentTxLog,
    StaticPeerPool, Transaction, ZERO_HASH,
};

const MINER: Address = [0x3E; 32];
const FRIEND: Address = [0xB0; 32];

struct Miner {
    node: Arc<MemoryFullNode>,
    tip: Option<BlockHeader>,
}

impl Miner {
    fn mine(&mut self, beneficiary: &Address, txs: Vec<Transaction>) {
        let mut builder = match &self.tip {
            Some(parent) => HeaderBuilder::child_of(parent),
            None => HeaderBuilder::new(ZERO_HASH, 0),
        }
        .beneficiary(address_hash(beneficiary));
        for tx in &txs {
            builder = match tx {
                Transaction::Funds(t) => builder.funds_tx(t),
                Transaction::Acc(t) => builder.acc_tx(t),
                Transaction::Config(t) => builder.config_tx(t),
            };
        }
        let header = builder.build();
        self.node.publish_block(header.clone(), txs);
        self.tip = Some(header);
    }
}

pub async fn run(config: LightClientConfig, address: Address) -> Result<()> {
    let stream_capacity = config.header_stream_capacity;
    let pool = Arc::new(StaticPeerPool::new());
    let (service, router) = LightClientService::new(config, pool.clone())?;
    let node = Arc::new(MemoryFullNode::new("demo-full-node", router));
    pool.add_peer(node.clone());
    node.register_account(Account::root(MINER));
    node.register_account(Account::new(address));

    let me = address_hash(&address);
    let friend = address_hash(&FRIEND);
    let mut miner = Miner { node: node.clone(), tip: None };

    miner.mine(&MINER, vec![ConfigTx::new(5, 50, 0, 0).into()]);
    miner.mine(&MINER, vec![AccTx::new(address_hash(&MINER), address, 1).into()]);
    miner.mine(&address, vec![FundsTx::new(friend, me, 30, 2, 0).into()]);
    miner.mine(&MINER, vec![FundsTx::new(me, friend, 20, 1, 0).into()]);

    let incoming = node.subscribe(stream_capacity);
    let listener = service
        .synchronize(incoming)
        .await
        .context("initial header sync")?;

    service.submit_funds_tx(FundsTx::new(me, friend, 5, 1, 1));
    report(&service, address).await?;

    miner.mine(&address, vec![FundsTx::new(me, friend, 5, 1, 1).into()]);
    miner.mine(&MINER, vec![]);
    let expected = service.header_count() + 2;
    for _ in 0..100 {
        if service.header_count() >= expected {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    report(&service, address).await?;

    listener.abort();
    Ok(())
}

async fn report(service: &LightClientService, address: Address) -> Result<()> {
    let mut account = Account::new(address);
    service
        .resolve_root_status(&mut account)
        .await
        .context("resolving root status")?;
    let mut recent = RecentTxLog::default();
    let summary = service
        .reconstruct_account_state(&mut account, &mut recent)
        .await
        .context("reconstructing account state")?;

    info!(
        headers = service.header_count(),
        balance = account.balance,
        tx_cnt = account.tx_cnt,
        created = account.is_created,
        root = account.is_root,
        block_reward = service.active_parameters().block_reward,
        "Account state"
    );
    info!(report = %serde_json::to_string(&summary)?, "Reconstruction summary");
    for entry in recent.iter() {
        info!(
            tx = %hex::encode(&entry.hash[..8]),
            amount = entry.tx.amount,
            status = ?entry.status,
            "Recent transaction"
        );
    }
    Ok(())
}
