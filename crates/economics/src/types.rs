//! Reward pools and economics parameters

use crate::errors::EconomicsError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Smallest unit of the core token (4 decimal places).
pub type CoreAmount = i64;

/// 21 * 10^8, the base unit for pool capacities.
const POOL_CAPACITY_UNIT: u64 = 21 * 10_000 * 10_000;

/// The three inflation pools topped up on every block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardPoolKind {
    /// Producer block-fee pool, credited to the block's producer.
    BlockPay,
    /// Mining ("wood") pool, shared by producers in proportion to votes received.
    WoodPay,
    /// Dapp payee (DBP) pool, shared by resource weight once DBPs are active.
    DappPay,
}

impl RewardPoolKind {
    pub const ALL: [RewardPoolKind; 3] = [
        RewardPoolKind::BlockPay,
        RewardPoolKind::WoodPay,
        RewardPoolKind::DappPay,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RewardPoolKind::BlockPay => "block pay pool",
            RewardPoolKind::WoodPay => "wood pay pool",
            RewardPoolKind::DappPay => "dbp pay pool",
        }
    }
}

impl fmt::Display for RewardPoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Economics parameters fixed at genesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomicsParams {
    /// Full size of the block-pay holding pool.
    pub block_pay_pool_capacity: u64,
    /// Full size of the wood-pay holding pool.
    pub wood_pay_pool_capacity: u64,
    /// Full size of the dapp-pay holding pool.
    pub dapp_pay_pool_capacity: u64,
    /// Per-block emission of each pool while it is full; halves as it drains.
    pub origin_reward_block_pay: u64,
    pub origin_reward_wood_pay: u64,
    pub origin_reward_dapp_pay: u64,
    /// Claims whose combined value is below this pay nothing.
    pub reward_get_min: u64,
    /// Base claim cool-down in microseconds, scaled by `1 + punish_count`.
    pub reward_time_sep_micros: u64,
    /// Flat dapp payout before the DBP class is activated.
    pub dapp_pay_unactive: u64,
    /// Resource trades pay `ceil(amount / resource_fee_divisor)` as fee.
    pub resource_fee_divisor: u64,
}

impl Default for EconomicsParams {
    fn default() -> Self {
        Self {
            block_pay_pool_capacity: POOL_CAPACITY_UNIT * 1500,
            wood_pay_pool_capacity: POOL_CAPACITY_UNIT * 1500,
            dapp_pay_pool_capacity: POOL_CAPACITY_UNIT * 3000,
            origin_reward_block_pay: 5000,
            origin_reward_wood_pay: 5000,
            origin_reward_dapp_pay: 5000,
            reward_get_min: 1_000_000,
            // 6 hours
            reward_time_sep_micros: 6 * 60 * 60 * 1_000_000,
            dapp_pay_unactive: 1000 * 10000,
            resource_fee_divisor: 200,
        }
    }
}

impl EconomicsParams {
    pub fn pool_capacity(&self, pool: RewardPoolKind) -> u64 {
        match pool {
            RewardPoolKind::BlockPay => self.block_pay_pool_capacity,
            RewardPoolKind::WoodPay => self.wood_pay_pool_capacity,
            RewardPoolKind::DappPay => self.dapp_pay_pool_capacity,
        }
    }

    pub fn origin_reward(&self, pool: RewardPoolKind) -> u64 {
        match pool {
            RewardPoolKind::BlockPay => self.origin_reward_block_pay,
            RewardPoolKind::WoodPay => self.origin_reward_wood_pay,
            RewardPoolKind::DappPay => self.origin_reward_dapp_pay,
        }
    }

    /// Reject parameter sets that would make emission or claims degenerate.
    pub fn validate(&self) -> Result<(), EconomicsError> {
        for pool in RewardPoolKind::ALL {
            if self.pool_capacity(pool) == 0 {
                return Err(EconomicsError::InvalidParameter("pool capacity must be positive"));
            }
            if self.origin_reward(pool) == 0 {
                return Err(EconomicsError::InvalidParameter("origin reward must be positive"));
            }
        }
        if self.reward_time_sep_micros == 0 {
            return Err(EconomicsError::InvalidParameter(
                "reward_time_sep_micros must be positive",
            ));
        }
        if self.resource_fee_divisor == 0 {
            return Err(EconomicsError::InvalidParameter(
                "resource_fee_divisor must be positive",
            ));
        }
        Ok(())
    }
}

/// One pool's top-up for a single block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolEmission {
    pub pool: RewardPoolKind,
    /// Holding-account balance the emission was derived from.
    pub balance: CoreAmount,
    pub halftime: u32,
    pub amount: CoreAmount,
}

/// Amounts owed to one claimant, by pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimPayout {
    pub block_pay: CoreAmount,
    pub wood_pay: CoreAmount,
    pub dapp_pay: CoreAmount,
}

impl ClaimPayout {
    pub fn total(&self) -> CoreAmount {
        self.block_pay
            .saturating_add(self.wood_pay)
            .saturating_add(self.dapp_pay)
    }

    pub fn is_empty(&self) -> bool {
        self.block_pay == 0 && self.wood_pay == 0 && self.dapp_pay == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_economics_params_default() {
        let params = EconomicsParams::default();
        assert_eq!(params.block_pay_pool_capacity, 3_150_000_000_000);
        assert_eq!(params.wood_pay_pool_capacity, 3_150_000_000_000);
        assert_eq!(params.dapp_pay_pool_capacity, 6_300_000_000_000);
        assert_eq!(params.origin_reward(RewardPoolKind::WoodPay), 5000);
        assert_eq!(params.reward_time_sep_micros, 21_600_000_000);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = EconomicsParams {
            wood_pay_pool_capacity: 0,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_payout_total() {
        let payout = ClaimPayout {
            block_pay: 10,
            wood_pay: 20,
            dapp_pay: 30,
        };
        assert_eq!(payout.total(), 60);
        assert!(!payout.is_empty());
        assert!(ClaimPayout::default().is_empty());
    }
}
