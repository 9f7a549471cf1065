//! Deferred transfers
//!
//! Effects that must happen later (unstake refunds, refunds of outbid name
//! bids) are queued here with a due time and drained by the block driver.

use crate::token_ledger::Transfer;
use celes_types::TimePoint;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// A transfer waiting for its due time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTransfer {
    pub id: u64,
    pub due: TimePoint,
    pub transfer: Transfer,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct OutboxRepr {
    next_id: u64,
    pending: Vec<ScheduledTransfer>,
}

/// Pending transfers ordered by (due time, insertion order).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "OutboxRepr", into = "OutboxRepr")]
pub struct Outbox {
    next_id: u64,
    pending: BTreeMap<(TimePoint, u64), Transfer>,
}

impl From<OutboxRepr> for Outbox {
    fn from(repr: OutboxRepr) -> Self {
        let mut next_id = repr.next_id;
        let pending = repr
            .pending
            .into_iter()
            .map(|entry| {
                next_id = next_id.max(entry.id + 1);
                ((entry.due, entry.id), entry.transfer)
            })
            .collect();
        Outbox { next_id, pending }
    }
}

impl From<Outbox> for OutboxRepr {
    fn from(outbox: Outbox) -> Self {
        OutboxRepr {
            next_id: outbox.next_id,
            pending: outbox
                .pending
                .into_iter()
                .map(|((due, id), transfer)| ScheduledTransfer { id, due, transfer })
                .collect(),
        }
    }
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Queue `transfer` to run at or after `due`. Returns its id.
    pub fn schedule(&mut self, due: TimePoint, transfer: Transfer) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        debug!(target: "treasury", "scheduled {:?} for {}", transfer, due);
        self.pending.insert((due, id), transfer);
        id
    }

    /// Remove and return every entry due at or before `now`, oldest first.
    pub fn drain_due(&mut self, now: TimePoint) -> Vec<ScheduledTransfer> {
        let later = self.pending.split_off(&(now, u64::MAX));
        let due = std::mem::replace(&mut self.pending, later);
        due.into_iter()
            .map(|((due, id), transfer)| ScheduledTransfer { id, due, transfer })
            .collect()
    }

    /// Pending entries in due order.
    pub fn iter(&self) -> impl Iterator<Item = ScheduledTransfer> + '_ {
        self.pending.iter().map(|((due, id), transfer)| ScheduledTransfer {
            id: *id,
            due: *due,
            transfer: transfer.clone(),
        })
    }

    /// Drop a pending entry, e.g. when a refund is re-staked.
    pub fn cancel(&mut self, id: u64) -> Option<ScheduledTransfer> {
        let key = self.pending.keys().find(|(_, entry)| *entry == id).copied()?;
        self.pending
            .remove(&key)
            .map(|transfer| ScheduledTransfer {
                id,
                due: key.0,
                transfer,
            })
    }
}
