//! Bounded-batch cleanup of expired vote history.
//!
//! Every routine takes an explicit row quota and returns what is left of it,
//! so a single transition never scans an unbounded range. All of them are
//! no-ops once nothing qualifies.

use crate::producers::ProducerTable;
use crate::wood::WoodLedger;
use celes_types::{BlockNum, GlobalState};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Rows removed by one compaction pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactionReport {
    pub producer_stats_removed: u32,
    pub burns_removed: u32,
    pub remaining_quota: u32,
}

/// Delete per-producer stats older than `before_block`, subtracting each row's
/// votes from its producer (clamped at zero) and from the global vote weight.
/// Returns the unused part of `max_rows`.
pub fn compact_producer_stats(
    global: &mut GlobalState,
    producers: &mut ProducerTable,
    ledger: &mut WoodLedger,
    before_block: BlockNum,
    max_rows: u32,
) -> u32 {
    let ids = ledger
        .producer_stats
        .ids_before(before_block, max_rows as usize);
    let mut removed = 0u32;

    for id in ids {
        let Some(row) = ledger.producer_stats.remove(id) else {
            continue;
        };
        let decayed = producers.decay_votes(&row.producer, row.stat);
        global.total_producer_vote_weight = global.total_producer_vote_weight.saturating_sub(decayed);
        removed += 1;
        debug!(
            target: "compactor",
            "expired {} votes of {} at block {}",
            row.stat, row.producer, row.block_number
        );
    }

    max_rows - removed
}

/// Delete consumed proofs older than `before_block`. Returns the unused quota.
pub fn compact_vote_history(ledger: &mut WoodLedger, before_block: BlockNum, max_rows: u32) -> u32 {
    let ids = ledger.burns.ids_before(before_block, max_rows as usize);
    let mut removed = 0u32;
    for id in ids {
        if ledger.burns.remove(id).is_some() {
            removed += 1;
        }
    }
    if removed > 0 {
        debug!(target: "compactor", "removed {} wood records before block {}", removed, before_block);
    }
    max_rows - removed
}

/// Delete difficulty records more than three periods older than `head`.
/// Unbounded; returns the number of records removed.
pub fn compact_difficulty_history(ledger: &mut WoodLedger, head: BlockNum, period: BlockNum) -> usize {
    let horizon = 3 * period as u64;
    let expired: Vec<BlockNum> = ledger
        .block_stats
        .keys()
        .take_while(|block| **block as u64 + horizon < head as u64)
        .copied()
        .collect();
    for block in &expired {
        ledger.block_stats.remove(block);
    }
    if !expired.is_empty() {
        debug!(target: "compactor", "removed {} difficulty records", expired.len());
    }
    expired.len()
}

/// One opportunistic pass: producer stats first, proofs with what is left.
pub fn compact_expired(
    global: &mut GlobalState,
    producers: &mut ProducerTable,
    ledger: &mut WoodLedger,
    before_block: BlockNum,
    quota: u32,
) -> CompactionReport {
    let after_stats = compact_producer_stats(global, producers, ledger, before_block, quota);
    let remaining = compact_vote_history(ledger, before_block, after_stats);
    CompactionReport {
        producer_stats_removed: quota - after_stats,
        burns_removed: after_stats - remaining,
        remaining_quota: remaining,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::GovernanceParams;
    use crate::types::BlockStat;
    use celes_types::{Name, PublicKey, TimePoint};

    fn name(s: &str) -> Name {
        Name::new(s).unwrap()
    }

    fn setup() -> (GlobalState, ProducerTable, WoodLedger) {
        let mut producers = ProducerTable::new();
        producers
            .register(
                name("bp"),
                PublicKey::from_bytes([1; 33]),
                String::new(),
                0,
                TimePoint::ZERO,
                &GovernanceParams::default(),
            )
            .unwrap();
        let mut ledger = WoodLedger::new();
        let mut global = GlobalState::default();
        for block in 1..=4 {
            for _ in 0..2 {
                ledger.producer_stats.increment(name("bp"), block);
                ledger.burns.insert(name("v"), block, format!("{:x}", ledger.burns.len() + 1));
            }
        }
        producers.update(&name("bp"), |p| p.total_votes = 8).unwrap();
        global.total_producer_vote_weight = 8;
        (global, producers, ledger)
    }

    #[test]
    fn test_stats_compaction_decays_weight() {
        let (mut global, mut producers, mut ledger) = setup();
        let remaining = compact_producer_stats(&mut global, &mut producers, &mut ledger, 3, 5);
        assert_eq!(remaining, 3);
        assert_eq!(producers.get(&name("bp")).unwrap().total_votes, 4);
        assert_eq!(global.total_producer_vote_weight, 4);
        assert_eq!(ledger.producer_stats.len(), 2);
    }

    #[test]
    fn test_quota_bounds_each_pass() {
        let (mut global, mut producers, mut ledger) = setup();
        assert_eq!(compact_producer_stats(&mut global, &mut producers, &mut ledger, 10, 1), 0);
        assert_eq!(ledger.producer_stats.len(), 3);
        assert_eq!(compact_vote_history(&mut ledger, 10, 3), 0);
        assert_eq!(ledger.burns.len(), 5);
    }

    #[test]
    fn test_compaction_is_idempotent() {
        let (mut global, mut producers, mut ledger) = setup();
        let first = compact_expired(&mut global, &mut producers, &mut ledger, 2, 5);
        assert_eq!(first.producer_stats_removed, 1);
        assert_eq!(first.burns_removed, 2);
        assert_eq!(first.remaining_quota, 2);

        let before = (global.clone(), producers.clone(), ledger.clone());
        let second = compact_expired(&mut global, &mut producers, &mut ledger, 2, 5);
        assert_eq!(second.remaining_quota, 5);
        assert_eq!((global, producers, ledger), before);
    }

    #[test]
    fn test_weight_never_goes_negative() {
        let (mut global, mut producers, mut ledger) = setup();
        producers.update(&name("bp"), |p| p.total_votes = 1).unwrap();
        global.total_producer_vote_weight = 1;
        compact_producer_stats(&mut global, &mut producers, &mut ledger, 10, 10);
        assert_eq!(producers.get(&name("bp")).unwrap().total_votes, 0);
        assert_eq!(global.total_producer_vote_weight, 0);
    }

    #[test]
    fn test_difficulty_history_keeps_three_periods() {
        let mut ledger = WoodLedger::new();
        for block in [1, 121, 241, 361, 481] {
            ledger.block_stats.insert(
                block,
                BlockStat {
                    block_number: block,
                    stat: 0,
                    diff: 1.0,
                },
            );
        }
        // 1 + 360 < 481 and 121 + 360 == 481
        assert_eq!(compact_difficulty_history(&mut ledger, 481, 120), 1);
        assert_eq!(compact_difficulty_history(&mut ledger, 481, 120), 0);
        assert_eq!(ledger.block_stats.len(), 4);
    }
}
