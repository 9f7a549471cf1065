//! Claim settlement: how much of each accrual account a claimant receives.

use crate::types::{ClaimPayout, CoreAmount, EconomicsParams};
use serde::{Deserialize, Serialize};

/// Dapp-payee standing of a claimant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DappStanding {
    /// Claimant is not a registered DBP.
    NotRegistered,
    /// Registered, but the DBP class has not been activated yet.
    PreActivation,
    /// Registered and active: share the accrual balance by resource weight.
    Active {
        unpaid_weight: u64,
        total_unpaid_weight: u64,
    },
}

/// Everything a claim settlement depends on, read fresh at claim time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimInputs {
    /// Unpaid block fee of the claimant, zero unless it is an active producer.
    pub unpaid_block_fee: u64,
    pub block_accrual_balance: CoreAmount,
    /// Votes received by the claimant that were not paid yet.
    pub unpaid_wood: u64,
    pub total_unpaid_wood: u64,
    pub wood_accrual_balance: CoreAmount,
    pub dapp: DappStanding,
    pub dapp_accrual_balance: CoreAmount,
}

/// `max(1, balance * part / total)` when all three are positive, else zero.
///
/// Returns zero as well when `part > total`, which indicates corrupted
/// bookkeeping rather than a real entitlement.
pub fn proportional_share(balance: CoreAmount, part: u64, total: u64) -> CoreAmount {
    if balance <= 0 || part == 0 || total == 0 || part > total {
        return 0;
    }
    let share = (balance as u128) * (part as u128) / (total as u128);
    // share <= balance, so it fits
    (share as CoreAmount).max(1)
}

/// `amount` if the accrual account can pay all of it, else zero.
fn covered(amount: CoreAmount, accrual_balance: CoreAmount) -> CoreAmount {
    if amount > accrual_balance {
        0
    } else {
        amount
    }
}

/// Split a claim into its three components. A component its accrual account
/// cannot cover is dropped first; then the minimum-payout rule applies to
/// what is left: if the sum is below `reward_get_min` every component is zeroed.
pub fn compute_claim(inputs: &ClaimInputs, params: &EconomicsParams) -> ClaimPayout {
    let block_fee = CoreAmount::try_from(inputs.unpaid_block_fee).unwrap_or(CoreAmount::MAX);
    let block_pay = covered(block_fee, inputs.block_accrual_balance);
    let wood_pay = proportional_share(
        inputs.wood_accrual_balance,
        inputs.unpaid_wood,
        inputs.total_unpaid_wood,
    );
    let dapp_pay = match inputs.dapp {
        DappStanding::NotRegistered => 0,
        DappStanding::PreActivation => covered(
            CoreAmount::try_from(params.dapp_pay_unactive).unwrap_or(CoreAmount::MAX),
            inputs.dapp_accrual_balance,
        ),
        DappStanding::Active {
            unpaid_weight,
            total_unpaid_weight,
        } => proportional_share(inputs.dapp_accrual_balance, unpaid_weight, total_unpaid_weight),
    };

    let payout = ClaimPayout {
        block_pay,
        wood_pay,
        dapp_pay,
    };

    let min = CoreAmount::try_from(params.reward_get_min).unwrap_or(CoreAmount::MAX);
    if payout.total() < min {
        return ClaimPayout::default();
    }
    payout
}

/// Claim cool-down for a claimant with `punish_count` outstanding punishments.
pub fn claim_cooldown_micros(params: &EconomicsParams, punish_count: u16) -> u64 {
    params
        .reward_time_sep_micros
        .saturating_mul(1 + punish_count as u64)
}

/// True once strictly more than the cool-down has passed since `last_claim_micros`.
pub fn cooldown_elapsed(
    now_micros: u64,
    last_claim_micros: u64,
    punish_count: u16,
    params: &EconomicsParams,
) -> bool {
    now_micros.saturating_sub(last_claim_micros) > claim_cooldown_micros(params, punish_count)
}
