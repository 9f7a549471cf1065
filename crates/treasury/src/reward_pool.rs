//! Reward Pool Accounts
//!
//! Each inflation pool is a pair of ledger accounts: a holding account that
//! drains on every block, and an accrual account claimants are paid from.

use celes_economics::{PoolEmission, RewardPoolKind};
use celes_types::{Asset, Name, Symbol};
use serde::{Deserialize, Serialize};

use crate::token_ledger::Transfer;

/// Ledger accounts the system core moves funds between.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemAccounts {
    /// The system account itself; authority for administrative actions
    pub system: Name,
    pub block_pay_pool: Name,
    pub block_pay: Name,
    pub wood_pay_pool: Name,
    pub wood_pay: Name,
    pub dapp_pay_pool: Name,
    pub dapp_pay: Name,
    /// Core tokens backing purchased resource units
    pub ram: Name,
    pub ram_fee: Name,
    /// Staked tokens awaiting refund
    pub stake: Name,
    /// Escrow of open name bids
    pub names: Name,
    /// Authority for DBP registration
    pub dbp: Name,
}

impl Default for SystemAccounts {
    fn default() -> Self {
        Self {
            system: known("celes"),
            block_pay_pool: known("celes.bpayp"),
            block_pay: known("celes.bpay"),
            wood_pay_pool: known("celes.wpayp"),
            wood_pay: known("celes.wpay"),
            dapp_pay_pool: known("celes.dpayp"),
            dapp_pay: known("celes.dpay"),
            ram: known("celes.ram"),
            ram_fee: known("celes.ramfee"),
            stake: known("celes.stake"),
            names: known("celes.names"),
            dbp: known("celes.dbp"),
        }
    }
}

/// Parse a name that is known to be valid, falling back to the empty name.
fn known(text: &str) -> Name {
    Name::new(text).unwrap_or(Name::EMPTY)
}

impl SystemAccounts {
    /// Holding account drained by per-block emission.
    pub fn pool_account(&self, pool: RewardPoolKind) -> Name {
        match pool {
            RewardPoolKind::BlockPay => self.block_pay_pool,
            RewardPoolKind::WoodPay => self.wood_pay_pool,
            RewardPoolKind::DappPay => self.dapp_pay_pool,
        }
    }

    /// Accrual account claims are paid from.
    pub fn accrual_account(&self, pool: RewardPoolKind) -> Name {
        match pool {
            RewardPoolKind::BlockPay => self.block_pay,
            RewardPoolKind::WoodPay => self.wood_pay,
            RewardPoolKind::DappPay => self.dapp_pay,
        }
    }

    /// Memo attached to payouts from `pool`.
    pub fn payout_memo(pool: RewardPoolKind) -> &'static str {
        match pool {
            RewardPoolKind::BlockPay => "unallocated inflation",
            RewardPoolKind::WoodPay => "wood pay",
            RewardPoolKind::DappPay => "dapp pay",
        }
    }

    /// Transfer moving one block's emission from holding to accrual.
    pub fn top_up(&self, emission: &PoolEmission, symbol: Symbol) -> Transfer {
        Transfer::new(
            self.pool_account(emission.pool),
            self.accrual_account(emission.pool),
            Asset::new(emission.amount, symbol),
            emission.pool.label(),
        )
    }

    /// Transfer paying `amount` of `pool` to `owner`.
    pub fn payout(&self, pool: RewardPoolKind, owner: Name, amount: i64, symbol: Symbol) -> Transfer {
        Transfer::new(
            self.accrual_account(pool),
            owner,
            Asset::new(amount, symbol),
            Self::payout_memo(pool),
        )
    }

    /// Accounts that can never be the target of a user action.
    pub fn is_reserved(&self, account: &Name) -> bool {
        [
            self.system,
            self.block_pay_pool,
            self.block_pay,
            self.wood_pay_pool,
            self.wood_pay,
            self.dapp_pay_pool,
            self.dapp_pay,
            self.ram,
            self.ram_fee,
            self.stake,
            self.names,
        ]
        .contains(account)
    }
}
