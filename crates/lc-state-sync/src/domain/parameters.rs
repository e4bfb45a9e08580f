//! # Network Parameters
//!
//! Network-wide economic and consensus parameters, changed only by
//! configuration transactions replayed in chain order.

use serde::{Deserialize, Serialize};

use super::transactions::ConfigTx;

/// Parameters in force at a point of the chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveParameters {
    /// Maximum block size in bytes.
    pub block_size: u64,
    /// Blocks between difficulty adjustments.
    pub diff_interval: u64,
    /// Minimum fee accepted by miners.
    pub fee_minimum: u64,
    /// Target seconds between blocks.
    pub block_interval: u64,
    /// Reward credited to a block's beneficiary.
    pub block_reward: u64,
    /// Minimum stake for validators.
    pub staking_minimum: u64,
    /// Blocks a validator waits after staking.
    pub waiting_minimum: u64,
    /// Accepted clock drift in seconds.
    pub accepted_time_diff: u64,
    /// Window (in blocks) for slashing evidence.
    pub slashing_window_size: u64,
    /// Reward for reporting a slashable offence.
    pub slashing_reward: u64,
}

impl Default for ActiveParameters {
    fn default() -> Self {
        Self {
            block_size: 5000,
            diff_interval: 14,
            fee_minimum: 1,
            block_interval: 15,
            block_reward: 0,
            staking_minimum: 1000,
            waiting_minimum: 0,
            accepted_time_diff: 60,
            slashing_window_size: 100,
            slashing_reward: 2,
        }
    }
}

/// Identifier carried in `ConfigTx::id`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParameterId {
    /// `block_size`
    BlockSize = 1,
    /// `diff_interval`
    DiffInterval = 2,
    /// `fee_minimum`
    FeeMinimum = 3,
    /// `block_interval`
    BlockInterval = 4,
    /// `block_reward`
    BlockReward = 5,
    /// `staking_minimum`
    StakingMinimum = 6,
    /// `waiting_minimum`
    WaitingMinimum = 7,
    /// `accepted_time_diff`
    AcceptedTimeDiff = 8,
    /// `slashing_window_size`
    SlashingWindowSize = 9,
    /// `slashing_reward`
    SlashingReward = 10,
}

impl ParameterId {
    /// Inclusive bounds a payload must fall in to be applied.
    pub fn bounds(self) -> (u64, u64) {
        match self {
            ParameterId::BlockSize => (1000, 100_000_000),
            ParameterId::DiffInterval => (3, u64::MAX),
            ParameterId::FeeMinimum => (0, u64::MAX),
            ParameterId::BlockInterval => (3, u64::MAX),
            ParameterId::BlockReward => (0, u64::MAX),
            ParameterId::StakingMinimum => (5, u64::MAX),
            ParameterId::WaitingMinimum => (0, 100_000),
            ParameterId::AcceptedTimeDiff => (0, 100),
            ParameterId::SlashingWindowSize => (0, 10_000),
            ParameterId::SlashingReward => (0, 10_000),
        }
    }

    /// Whether `payload` is an acceptable value for this parameter.
    pub fn accepts(self, payload: u64) -> bool {
        let (min, max) = self.bounds();
        (min..=max).contains(&payload)
    }
}

impl TryFrom<u8> for ParameterId {
    type Error = u8;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Ok(match id {
            1 => ParameterId::BlockSize,
            2 => ParameterId::DiffInterval,
            3 => ParameterId::FeeMinimum,
            4 => ParameterId::BlockInterval,
            5 => ParameterId::BlockReward,
            6 => ParameterId::StakingMinimum,
            7 => ParameterId::WaitingMinimum,
            8 => ParameterId::AcceptedTimeDiff,
            9 => ParameterId::SlashingWindowSize,
            10 => ParameterId::SlashingReward,
            other => return Err(other),
        })
    }
}

impl ActiveParameters {
    fn slot_mut(&mut self, id: ParameterId) -> &mut u64 {
        match id {
            ParameterId::BlockSize => &mut self.block_size,
            ParameterId::DiffInterval => &mut self.diff_interval,
            ParameterId::FeeMinimum => &mut self.fee_minimum,
            ParameterId::BlockInterval => &mut self.block_interval,
            ParameterId::BlockReward => &mut self.block_reward,
            ParameterId::StakingMinimum => &mut self.staking_minimum,
            ParameterId::WaitingMinimum => &mut self.waiting_minimum,
            ParameterId::AcceptedTimeDiff => &mut self.accepted_time_diff,
            ParameterId::SlashingWindowSize => &mut self.slashing_window_size,
            ParameterId::SlashingReward => &mut self.slashing_reward,
        }
    }

    /// Apply configuration transactions in slice order.
    ///
    /// Unknown ids and out-of-bounds payloads are skipped. Returns whether
    /// any parameter changed.
    pub fn apply_config_txs(&mut self, txs: &[ConfigTx]) -> bool {
        let mut changed = false;
        for tx in txs {
            let Ok(id) = ParameterId::try_from(tx.id) else {
                tracing::debug!(id = tx.id, "Ignoring config tx with unknown parameter id");
                continue;
            };
            if !id.accepts(tx.payload) {
                tracing::debug!(?id, payload = tx.payload, "Ignoring out-of-bounds parameter change");
                continue;
            }
            let slot = self.slot_mut(id);
            if *slot != tx.payload {
                *slot = tx.payload;
                changed = true;
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_reward_change() {
        let mut params = ActiveParameters::default();
        let changed = params.apply_config_txs(&[ConfigTx::new(5, 50, 1, 0)]);
        assert!(changed);
        assert_eq!(params.block_reward, 50);
    }

    #[test]
    fn test_later_tx_wins() {
        let mut params = ActiveParameters::default();
        params.apply_config_txs(&[ConfigTx::new(5, 50, 1, 0), ConfigTx::new(5, 70, 1, 1)]);
        assert_eq!(params.block_reward, 70);
    }

    #[test]
    fn test_out_of_bounds_ignored() {
        let mut params = ActiveParameters::default();
        let changed = params.apply_config_txs(&[ConfigTx::new(1, 10, 1, 0)]);
        assert!(!changed);
        assert_eq!(params.block_size, 5000);
    }

    #[test]
    fn test_unknown_id_ignored() {
        let mut params = ActiveParameters::default();
        assert!(!params.apply_config_txs(&[ConfigTx::new(42, 10, 1, 0)]));
        assert_eq!(params, ActiveParameters::default());
    }

    #[test]
    fn test_parameter_id_roundtrip() {
        for id in 1u8..=10 {
            let parsed = ParameterId::try_from(id).unwrap();
            assert_eq!(parsed as u8, id);
        }
        assert_eq!(ParameterId::try_from(0), Err(0));
    }
}
