//! # Replay Effects
//!
//! How each validated transaction changes an account. Fetching and
//! validation happen in the reconstructor; everything here is synchronous
//! bookkeeping on a working copy that is committed only on success.

use std::collections::HashSet;

use crate::domain::{
    AccTx, Account, ActiveParameters, BlockHeader, ConfigTx, FundsTx, Hash, LightClientError,
    ReconstructionReport, RecentTxLog, TxStatus,
};

/// Working state of one reconstruction.
#[derive(Clone, Debug)]
pub struct ReplayState {
    /// Account being derived.
    pub account: Account,
    /// Parameters in force at the block being replayed.
    pub parameters: ActiveParameters,
    /// Recent incoming transactions.
    pub recent: RecentTxLog,
    /// Counters for the caller.
    pub report: ReconstructionReport,
    confirmed: HashSet<Hash>,
}

impl ReplayState {
    /// Start from `account` under `parameters`.
    pub fn new(account: Account, parameters: ActiveParameters, recent: RecentTxLog) -> Self {
        Self {
            account,
            parameters,
            recent,
            report: ReconstructionReport::default(),
            confirmed: HashSet::new(),
        }
    }

    fn credit(&mut self, amount: u64) -> Result<(), LightClientError> {
        self.account.balance = self
            .account
            .balance
            .checked_add(amount)
            .ok_or(LightClientError::BalanceOverflow { amount })?;
        Ok(())
    }

    fn debit(&mut self, amount: u64) -> Result<(), LightClientError> {
        self.account.balance = self.account.balance.checked_sub(amount).ok_or(
            LightClientError::BalanceUnderflow {
                needed: amount,
                available: self.account.balance,
            },
        )?;
        Ok(())
    }

    /// Whether the account produced `block`.
    pub fn is_beneficiary(&self, block: &BlockHeader) -> bool {
        block.beneficiary == self.account.address_hash
    }

    /// Credit the block reward in force if the account produced `block`.
    pub fn apply_block_reward(&mut self, block: &BlockHeader) -> Result<(), LightClientError> {
        if self.is_beneficiary(block) {
            self.credit(self.parameters.block_reward)?;
        }
        Ok(())
    }

    /// Whether a funds transaction in `block` concerns the account.
    pub fn funds_tx_concerns(&self, block: &BlockHeader, tx: &FundsTx) -> bool {
        let me = self.account.address_hash;
        tx.from == me || tx.to == me || block.beneficiary == me
    }

    /// Apply a validated funds transaction from `block`.
    ///
    /// The sender is debited amount and fee unless it is a root account,
    /// and its counter always increments. The recipient is credited the
    /// amount and the transaction logged as verified. A beneficiary also
    /// collects the fee.
    pub fn apply_funds_tx(
        &mut self,
        block: &BlockHeader,
        tx_hash: Hash,
        tx: &FundsTx,
    ) -> Result<(), LightClientError> {
        let me = self.account.address_hash;
        self.confirmed.insert(tx_hash);

        if tx.from == me {
            if !self.account.is_root {
                let total = tx
                    .total_debit()
                    .ok_or(LightClientError::BalanceOverflow { amount: tx.amount })?;
                self.debit(total)?;
            }
            self.account.tx_cnt += 1;
        }

        if tx.to == me {
            self.credit(tx.amount)?;
            self.recent.push(tx_hash, tx.clone(), TxStatus::Verified);
        }

        if block.beneficiary == me {
            self.credit(tx.fee)?;
        }

        self.report.transactions_applied += 1;
        Ok(())
    }

    /// Whether an account-creation transaction in `block` concerns the account.
    pub fn acc_tx_concerns(&self, block: &BlockHeader, tx: &AccTx) -> bool {
        tx.pub_key == self.account.address || self.is_beneficiary(block)
    }

    /// Apply a validated account-creation transaction from `block`.
    pub fn apply_acc_tx(&mut self, block: &BlockHeader, tx: &AccTx) -> Result<(), LightClientError> {
        if tx.pub_key == self.account.address {
            self.account.is_created = true;
        }
        if self.is_beneficiary(block) {
            self.credit(tx.fee)?;
        }
        self.report.transactions_applied += 1;
        Ok(())
    }

    /// Credit a validated configuration transaction's fee to the beneficiary.
    pub fn collect_config_fee(&mut self, tx: &ConfigTx) -> Result<(), LightClientError> {
        self.credit(tx.fee)?;
        self.report.transactions_applied += 1;
        Ok(())
    }

    /// Install parameters produced by a configuration transaction.
    pub fn update_parameters(&mut self, updated: ActiveParameters) {
        if updated != self.parameters {
            self.parameters = updated;
            self.report.parameter_changes += 1;
        }
    }

    /// Merge pending funds transactions.
    ///
    /// Incoming ones are logged as not verified; outgoing ones bump the
    /// counter provisionally. Transactions already confirmed by a replayed
    /// block are skipped and reported for pruning.
    pub fn apply_pending(&mut self, pending: &[(Hash, FundsTx)]) {
        let me = self.account.address_hash;
        for (hash, tx) in pending {
            if self.confirmed.contains(hash) {
                self.report.confirmed_pending.push(*hash);
                continue;
            }
            if tx.to == me {
                self.recent.push(*hash, tx.clone(), TxStatus::NotVerified);
            }
            if tx.from == me {
                self.account.tx_cnt += 1;
            }
            self.report.pending_applied += 1;
        }
    }

    /// Finished account, parameters, log and report.
    pub fn into_parts(self) -> (Account, ActiveParameters, RecentTxLog, ReconstructionReport) {
        (self.account, self.parameters, self.recent, self.report)
    }
}
