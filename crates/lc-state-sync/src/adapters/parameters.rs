//! Parameter Rule Adapter
//!
//! Implements `ParameterRule` with per-parameter bounds: a change outside
//! its parameter's bounds, or naming an unknown parameter, is ignored.

use crate::domain::{ActiveParameters, ConfigTx};
use crate::ports::ParameterRule;

/// Applies configuration transactions within `ParameterId::bounds`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BoundedParameterRule;

impl ParameterRule for BoundedParameterRule {
    fn apply(&self, current: &ActiveParameters, txs: &[ConfigTx]) -> ActiveParameters {
        let mut next = current.clone();
        next.apply_config_txs(txs);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_later_change_wins() {
        let params = BoundedParameterRule.apply(
            &ActiveParameters::default(),
            &[ConfigTx::new(5, 10, 0, 0), ConfigTx::new(5, 20, 0, 1)],
        );
        assert_eq!(params.block_reward, 20);
    }

    #[test]
    fn test_out_of_bounds_ignored() {
        let current = ActiveParameters::default();
        let params = BoundedParameterRule.apply(&current, &[ConfigTx::new(8, 101, 0, 0)]);
        assert_eq!(params, current);
    }

    #[test]
    fn test_unknown_id_ignored() {
        let current = ActiveParameters::default();
        let params = BoundedParameterRule.apply(&current, &[ConfigTx::new(42, 7, 0, 0)]);
        assert_eq!(params, current);
    }
}
