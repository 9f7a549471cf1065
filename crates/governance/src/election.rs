//! Producer election and the network-activation latch

use crate::parameters::GovernanceParams;
use crate::producers::ProducerTable;
use crate::types::ScheduleEntry;
use celes_types::{BlockNum, GlobalState};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Result of one election round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionOutcome {
    /// Qualified candidates found, at most `bp_count`
    pub candidates: usize,
    /// The network latched active during this round
    pub activated: bool,
    /// Slate to publish, sorted by producer name. Only present once the
    /// network is active and a full slate exists.
    pub slate: Option<Vec<ScheduleEntry>>,
}

/// True once a full election interval has passed since the last one.
pub fn election_due(global: &GlobalState, head: BlockNum, params: &GovernanceParams) -> bool {
    head.saturating_sub(global.last_producer_schedule_block) >= params.singing_ticker_sep
}

/// True within the pre-election window, when expiring stats are pre-cleaned.
pub fn pre_election_window(global: &GlobalState, head: BlockNum, params: &GovernanceParams) -> bool {
    let next = global.last_producer_schedule_block as u64 + params.singing_ticker_sep as u64;
    next < head as u64 + params.pre_election_window as u64
}

/// Rank producers, advance the activation latch and build the next slate.
///
/// The slate is returned rather than published so the caller can commit it
/// together with the rest of the transition; `last_producer_schedule_size`
/// is recorded on the assumption that publication succeeds.
pub fn elect(
    global: &mut GlobalState,
    producers: &ProducerTable,
    head: BlockNum,
    params: &GovernanceParams,
) -> ElectionOutcome {
    global.last_producer_schedule_block = head;

    let mut top: Vec<ScheduleEntry> = producers
        .iter_ranked()
        .take_while(|p| p.is_active && p.total_votes > 0)
        .take(params.bp_count)
        .map(|p| ScheduleEntry {
            producer: p.owner,
            key: p.producer_key,
            location: p.location,
        })
        .collect();
    let full = top.len() >= params.bp_count;

    let mut activated = false;
    if !global.is_network_active {
        if full {
            global.active_touch_count = global.active_touch_count.saturating_add(1);
        } else {
            global.active_touch_count = 0;
        }
        if global.active_touch_count >= params.active_network_cycle {
            global.latch_network_active(head);
            activated = true;
            info!(target: "election", "network activated at block {}", head);
        }
    }
    debug!(
        target: "election",
        "election at block {}: {} candidates, touch count {}",
        head,
        top.len(),
        global.active_touch_count
    );

    let candidates = top.len();
    let slate = if global.is_network_active && full {
        top.sort_by_key(|entry| entry.producer);
        // bp_count is validated to fit in u16
        global.last_producer_schedule_size = top.len() as u16;
        Some(top)
    } else {
        None
    };

    ElectionOutcome {
        candidates,
        activated,
        slate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use celes_types::{Name, PublicKey, TimePoint};

    fn params() -> GovernanceParams {
        GovernanceParams {
            bp_count: 3,
            active_network_cycle: 2,
            ..Default::default()
        }
    }

    fn table(votes: &[(&str, u64)]) -> ProducerTable {
        let mut producers = ProducerTable::new();
        for (i, (owner, weight)) in votes.iter().enumerate() {
            let owner = Name::new(owner).unwrap();
            producers
                .register(
                    owner,
                    PublicKey::from_bytes([i as u8 + 1; 33]),
                    String::new(),
                    i as u16,
                    TimePoint::ZERO,
                    &params(),
                )
                .unwrap();
            producers.update(&owner, |p| p.total_votes = *weight).unwrap();
        }
        producers
    }

    #[test]
    fn test_never_publishes_before_activation() {
        let mut global = GlobalState::default();
        let producers = table(&[("carol", 3), ("alice", 1), ("bob", 2)]);

        let first = elect(&mut global, &producers, 100, &params());
        assert_eq!(first.candidates, 3);
        assert!(first.slate.is_none());
        assert!(!global.is_network_active);
        assert_eq!(global.last_producer_schedule_block, 100);

        let second = elect(&mut global, &producers, 200, &params());
        assert!(second.activated);
        assert!(global.is_network_active);
        assert_eq!(global.network_active_block, 200);

        let names: Vec<String> = second
            .slate
            .unwrap()
            .iter()
            .map(|e| e.producer.to_string())
            .collect();
        assert_eq!(names, vec!["alice", "bob", "carol"]);
        assert_eq!(global.last_producer_schedule_size, 3);
    }

    #[test]
    fn test_short_slate_resets_touch_count() {
        let mut global = GlobalState::default();
        let full = table(&[("alice", 1), ("bob", 2), ("carol", 3)]);
        let short = table(&[("alice", 1), ("bob", 2), ("carol", 0)]);

        elect(&mut global, &full, 1, &params());
        assert_eq!(global.active_touch_count, 1);
        let outcome = elect(&mut global, &short, 2, &params());
        assert_eq!(outcome.candidates, 2);
        assert_eq!(global.active_touch_count, 0);
        assert!(!global.is_network_active);
    }

    #[test]
    fn test_inactive_producers_are_skipped() {
        let mut global = GlobalState::default();
        let mut producers = table(&[("alice", 5), ("bob", 9), ("carol", 7), ("dave", 1)]);
        producers.deactivate(&Name::new("bob").unwrap()).unwrap();
        let outcome = elect(&mut global, &producers, 1, &params());
        assert_eq!(outcome.candidates, 3);
    }

    #[test]
    fn test_activation_is_permanent() {
        let mut global = GlobalState::default();
        let full = table(&[("alice", 1), ("bob", 2), ("carol", 3)]);
        elect(&mut global, &full, 1, &params());
        elect(&mut global, &full, 2, &params());
        assert!(global.is_network_active);

        let short = table(&[("alice", 1)]);
        let outcome = elect(&mut global, &short, 3, &params());
        assert!(global.is_network_active);
        assert!(outcome.slate.is_none());
        assert_eq!(global.last_producer_schedule_size, 3);
    }

    #[test]
    fn test_election_timers() {
        let params = GovernanceParams::default();
        let global = GlobalState {
            last_producer_schedule_block: 1000,
            ..Default::default()
        };
        assert!(!election_due(&global, 1000 + 3239, &params));
        assert!(election_due(&global, 1000 + 3240, &params));
        // window opens 29 blocks before the election
        assert!(!pre_election_window(&global, 1000 + 3240 - 30, &params));
        assert!(pre_election_window(&global, 1000 + 3240 - 29, &params));
    }
}
