//! Windowed difficulty controller.
//!
//! The target for a period is a 4:2:1 weighted average of the last three
//! periods' throughput relative to the target vote count:
//! `(w1*d1*4 + w2*d2*2 + w3*d3) / target / 7`, floored at the minimum.

use crate::parameters::GovernanceParams;
use crate::types::BlockStat;
use crate::wood::WoodLedger;
use celes_types::BlockNum;
use tracing::info;

/// True at the first block of a difficulty period.
pub fn is_period_start(head: BlockNum, params: &GovernanceParams) -> bool {
    head % params.difficulty_period == 1
}

/// Throughput and difficulty `lag` periods before `head`, with the baseline
/// for missing records or blocks before genesis.
fn lagged_sample(ledger: &WoodLedger, head: BlockNum, lag: u32, params: &GovernanceParams) -> (f64, f64) {
    let baseline = (params.target_wood_number as f64, params.baseline_difficulty);
    params
        .difficulty_period
        .checked_mul(lag)
        .and_then(|offset| head.checked_sub(offset))
        .and_then(|block| ledger.block_stats.get(&block))
        .map(|stat| (stat.stat as f64, stat.diff))
        .unwrap_or(baseline)
}

/// Difficulty for the period starting at `head`, without writing it.
pub fn compute_difficulty(ledger: &WoodLedger, head: BlockNum, params: &GovernanceParams) -> f64 {
    let (wood1, diff1) = lagged_sample(ledger, head, 1, params);
    let (wood2, diff2) = lagged_sample(ledger, head, 2, params);
    let (wood3, diff3) = lagged_sample(ledger, head, 3, params);

    let target = (wood1 * diff1 * 4.0 + wood2 * diff2 * 2.0 + wood3 * diff3)
        / params.target_wood_number as f64
        / 7.0;
    if target <= params.min_difficulty {
        params.min_difficulty
    } else {
        target
    }
}

/// Compute the difficulty for the period starting at `head` and store it in
/// that period's record, keeping any votes already counted there.
pub fn update_difficulty(ledger: &mut WoodLedger, head: BlockNum, params: &GovernanceParams) -> f64 {
    let diff = compute_difficulty(ledger, head, params);
    ledger
        .block_stats
        .entry(head)
        .and_modify(|stat| stat.diff = diff)
        .or_insert(BlockStat {
            block_number: head,
            stat: 0,
            diff,
        });
    info!(target: "difficulty", "difficulty for block {} set to {}", head, diff);
    diff
}
