//! Per-block driver

use crate::contract::Transition;
use crate::errors::Result;
use celes_economics::PoolEmission;
use celes_governance::{
    compact_difficulty_history, compact_producer_stats, elect, election_due, is_period_start,
    pre_election_window, update_difficulty, ElectionOutcome,
};
use celes_treasury::ScheduledTransfer;
use celes_types::Name;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Everything one block tick did.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockReport {
    pub emissions: Vec<PoolEmission>,
    /// New difficulty, on the first block of a difficulty period
    pub difficulty: Option<f64>,
    /// Producer-stat rows removed ahead of the election
    pub pre_cleaned: u32,
    pub election: Option<ElectionOutcome>,
    pub closed_auction: Option<Name>,
    pub resource_growth: u64,
    pub dbp_activated: bool,
    pub released: Vec<ScheduledTransfer>,
}

impl Transition<'_> {
    /// Run the per-block duties in order: reward top-ups, difficulty
    /// period roll-over, pre-election cleanup, election (with auction
    /// closing), resource growth, DBP activation, deferred transfers.
    pub(crate) fn on_block(&mut self, producer: Name) -> Result<BlockReport> {
        let mut report = BlockReport {
            emissions: self.top_up_rewards(producer)?,
            ..BlockReport::default()
        };

        let params = &self.config.governance;
        let head = self.head;
        let state = &mut self.state;

        if is_period_start(head, params) {
            let difficulty = update_difficulty(&mut state.governance.wood, head, params);
            compact_difficulty_history(&mut state.governance.wood, head, params.difficulty_period);
            self.effects.difficulty = Some(difficulty);
            report.difficulty = Some(difficulty);
        }

        if pre_election_window(&state.global, head, params) {
            let next_election = state
                .global
                .last_producer_schedule_block
                .saturating_add(params.singing_ticker_sep)
                .max(head);
            if let Some(cutoff) = params.retention_cutoff(next_election) {
                let quota = params.compaction_quota;
                let gov = &mut state.governance;
                let remaining = compact_producer_stats(
                    &mut state.global,
                    &mut gov.producers,
                    &mut gov.wood,
                    cutoff,
                    quota,
                );
                report.pre_cleaned = quota - remaining;
            }
        }

        if election_due(&state.global, head, params) {
            let outcome = elect(&mut state.global, &state.governance.producers, head, params);
            if let Some(slate) = &outcome.slate {
                self.effects.schedule = Some(slate.clone());
            }
            report.election = Some(outcome);
            if self.state.global.is_network_active {
                report.closed_auction = self.close_idle_auction();
            }
        }

        report.resource_growth = self.grow_resource_supply()?;
        report.dbp_activated = self.maybe_start_dbp_rewards()?;
        report.released = self.drain_outbox();

        debug!(
            target: "system",
            "block {} by {}: {} emissions, election {}",
            head,
            producer,
            report.emissions.len(),
            report.election.is_some()
        );
        Ok(report)
    }
}
