use crate::types::{CoreAmount, EconomicsParams, PoolEmission, RewardPoolKind};

/// Halvings beyond this shift the origin reward to zero anyway.
const MAX_HALFTIME: u32 = 63;

/// Number of halvings implied by the pool's fill ratio:
/// `floor(log2(capacity / balance))`, with the ratio itself an integer division.
///
/// A pool at or above capacity has halftime zero.
pub fn halftime(capacity: u64, balance: u64) -> u32 {
    if balance == 0 {
        return MAX_HALFTIME;
    }
    let ratio = capacity / balance;
    if ratio == 0 {
        0
    } else {
        ratio.ilog2()
    }
}

/// Per-block emission for a holding pool with the given balance:
/// `max(1, floor(origin_reward * 0.5^halftime))`, never more than the balance.
pub fn emission_for_balance(origin_reward: u64, capacity: u64, balance: u64) -> u64 {
    if balance == 0 {
        return 0;
    }
    let halvings = halftime(capacity, balance).min(MAX_HALFTIME);
    (origin_reward >> halvings).max(1).min(balance)
}

/// Compute the top-up of one pool, or `None` if its holding account is empty.
pub fn pool_emission(
    pool: RewardPoolKind,
    balance: CoreAmount,
    params: &EconomicsParams,
) -> Option<PoolEmission> {
    if balance <= 0 {
        return None;
    }
    let capacity = params.pool_capacity(pool);
    let origin = params.origin_reward(pool);
    let balance_u = balance as u64;
    let amount = emission_for_balance(origin, capacity, balance_u);

    Some(PoolEmission {
        pool,
        balance,
        halftime: halftime(capacity, balance_u),
        // emission never exceeds the (i64) balance
        amount: amount as CoreAmount,
    })
}

/// Sum of emissions if the pool were drained block by block starting from
/// `balance`, for at most `blocks` blocks.
pub fn project_drain(origin_reward: u64, capacity: u64, balance: u64, blocks: u64) -> u64 {
    let mut remaining = balance;
    let mut total = 0u64;
    for _ in 0..blocks {
        let amount = emission_for_balance(origin_reward, capacity, remaining);
        if amount == 0 {
            break;
        }
        remaining -= amount;
        total = total.saturating_add(amount);
    }
    total
}
