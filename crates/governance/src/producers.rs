//! Producer registry with an election-rank index

use crate::errors::{GovernanceError, Result};
use crate::parameters::GovernanceParams;
use crate::types::{ProducerInfo, RankKey};
use celes_types::{Name, PublicKey, TimePoint};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Producers keyed by owner, plus a secondary index ordered by [`RankKey`].
///
/// Serialised as a plain list; the index is rebuilt on load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<ProducerInfo>", into = "Vec<ProducerInfo>")]
pub struct ProducerTable {
    rows: BTreeMap<Name, ProducerInfo>,
    by_rank: BTreeSet<(RankKey, Name)>,
}

/// Outcome of [`ProducerTable::register`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Created,
    Updated,
}

impl ProducerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, owner: &Name) -> Option<&ProducerInfo> {
        self.rows.get(owner)
    }

    pub fn contains(&self, owner: &Name) -> bool {
        self.rows.contains_key(owner)
    }

    /// Fetch a producer or fail with `UnknownProducer`.
    pub fn require(&self, owner: &Name) -> Result<&ProducerInfo> {
        self.rows
            .get(owner)
            .ok_or(GovernanceError::UnknownProducer(*owner))
    }

    /// Insert or replace a row, keeping the rank index in step.
    pub fn put(&mut self, producer: ProducerInfo) {
        if let Some(old) = self.rows.get(&producer.owner) {
            self.by_rank.remove(&(old.rank_key(), old.owner));
        }
        self.by_rank.insert((producer.rank_key(), producer.owner));
        self.rows.insert(producer.owner, producer);
    }

    /// Read-modify-write of one row.
    pub fn update<F>(&mut self, owner: &Name, f: F) -> Result<&ProducerInfo>
    where
        F: FnOnce(&mut ProducerInfo),
    {
        let mut row = self.require(owner)?.clone();
        f(&mut row);
        row.owner = *owner;
        self.put(row);
        self.require(owner)
    }

    pub fn remove(&mut self, owner: &Name) -> Option<ProducerInfo> {
        let row = self.rows.remove(owner)?;
        self.by_rank.remove(&(row.rank_key(), row.owner));
        Some(row)
    }

    /// Producers in election order.
    pub fn iter_ranked(&self) -> impl Iterator<Item = &ProducerInfo> + '_ {
        self.by_rank
            .iter()
            .filter_map(move |(_, owner)| self.rows.get(owner))
    }

    /// Producers in owner order.
    pub fn iter(&self) -> impl Iterator<Item = &ProducerInfo> + '_ {
        self.rows.values()
    }

    /// Register a new producer or refresh an existing one.
    ///
    /// Re-registration updates key, url and location and reactivates the row;
    /// vote weight and unpaid counters are preserved, and the claim time is
    /// only set if it never was.
    pub fn register(
        &mut self,
        owner: Name,
        producer_key: PublicKey,
        url: String,
        location: u16,
        now: TimePoint,
        params: &GovernanceParams,
    ) -> Result<Registration> {
        if owner.is_empty() {
            return Err(GovernanceError::EmptyName("producer"));
        }
        if producer_key.is_empty() {
            return Err(GovernanceError::InvalidKey);
        }
        if url.len() >= params.max_url_len {
            return Err(GovernanceError::UrlTooLong {
                len: url.len(),
                max: params.max_url_len,
            });
        }

        match self.rows.get(&owner).cloned() {
            Some(mut row) => {
                row.producer_key = producer_key;
                row.is_active = true;
                row.url = url;
                row.location = location;
                if row.last_claim_time.is_zero() {
                    row.last_claim_time = now;
                }
                self.put(row);
                debug!(target: "election", "producer {} updated", owner);
                Ok(Registration::Updated)
            }
            None => {
                let mut row = ProducerInfo::new(owner, producer_key, url, location);
                row.last_claim_time = now;
                self.put(row);
                info!(target: "election", "producer {} registered", owner);
                Ok(Registration::Created)
            }
        }
    }

    /// Clear the producer's key and mark it inactive.
    pub fn deactivate(&mut self, owner: &Name) -> Result<()> {
        self.update(owner, ProducerInfo::deactivate)?;
        info!(target: "election", "producer {} deactivated", owner);
        Ok(())
    }

    /// Subtract `weight` from a producer's votes, clamped at zero.
    /// Returns the amount actually removed.
    pub fn decay_votes(&mut self, owner: &Name, weight: u64) -> u64 {
        let Some(mut row) = self.rows.get(owner).cloned() else {
            return 0;
        };
        let removed = weight.min(row.total_votes);
        row.total_votes -= removed;
        self.put(row);
        removed
    }
}

impl From<Vec<ProducerInfo>> for ProducerTable {
    fn from(rows: Vec<ProducerInfo>) -> Self {
        let mut table = ProducerTable::new();
        for row in rows {
            table.put(row);
        }
        table
    }
}

impl From<ProducerTable> for Vec<ProducerInfo> {
    fn from(table: ProducerTable) -> Self {
        table.rows.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> Name {
        Name::new(s).unwrap()
    }

    fn key(b: u8) -> PublicKey {
        PublicKey::from_bytes([b; 33])
    }

    fn now() -> TimePoint {
        TimePoint::from_secs(10)
    }

    fn with_votes(table: &mut ProducerTable, owner: &str, votes: u64) {
        table
            .register(name(owner), key(1), String::new(), 0, now(), &GovernanceParams::default())
            .unwrap();
        table.update(&name(owner), |p| p.total_votes = votes).unwrap();
    }

    #[test]
    fn test_register_rejects_empty_key() {
        let mut table = ProducerTable::new();
        let err = table
            .register(name("alice"), PublicKey::EMPTY, String::new(), 0, now(), &GovernanceParams::default())
            .unwrap_err();
        assert_eq!(err, GovernanceError::InvalidKey);
        assert!(table.is_empty());
    }

    #[test]
    fn test_register_rejects_long_url() {
        let mut table = ProducerTable::new();
        let url = "x".repeat(512);
        let err = table
            .register(name("alice"), key(1), url, 0, now(), &GovernanceParams::default())
            .unwrap_err();
        assert!(matches!(err, GovernanceError::UrlTooLong { len: 512, .. }));
    }

    #[test]
    fn test_reregistration_reactivates_and_keeps_votes() {
        let mut table = ProducerTable::new();
        with_votes(&mut table, "alice", 7);
        table.deactivate(&name("alice")).unwrap();
        assert!(!table.get(&name("alice")).unwrap().is_active);

        let outcome = table
            .register(name("alice"), key(2), "https://a".into(), 3, TimePoint::from_secs(99), &GovernanceParams::default())
            .unwrap();
        assert_eq!(outcome, Registration::Updated);
        let alice = table.get(&name("alice")).unwrap();
        assert!(alice.is_active);
        assert_eq!(alice.total_votes, 7);
        assert_eq!(alice.producer_key, key(2));
        assert_eq!(alice.location, 3);
        assert_eq!(alice.last_claim_time, now());
    }

    #[test]
    fn test_rank_index_orders_active_first() {
        let mut table = ProducerTable::new();
        with_votes(&mut table, "alice", 5);
        with_votes(&mut table, "bob", 9);
        with_votes(&mut table, "carol", 100);
        with_votes(&mut table, "dave", 1);
        table.deactivate(&name("carol")).unwrap();

        let order: Vec<String> = table.iter_ranked().map(|p| p.owner.to_string()).collect();
        assert_eq!(order, vec!["bob", "alice", "dave", "carol"]);
    }

    #[test]
    fn test_decay_clamps_at_zero() {
        let mut table = ProducerTable::new();
        with_votes(&mut table, "alice", 3);
        assert_eq!(table.decay_votes(&name("alice"), 5), 3);
        assert_eq!(table.get(&name("alice")).unwrap().total_votes, 0);
        assert_eq!(table.decay_votes(&name("nobody"), 5), 0);
    }

    #[test]
    fn test_decay_moves_producer_down_the_ranking() {
        let mut table = ProducerTable::new();
        with_votes(&mut table, "alice", 10);
        with_votes(&mut table, "bob", 6);
        assert_eq!(table.decay_votes(&name("alice"), 7), 7);

        let order: Vec<String> = table.iter_ranked().map(|p| p.owner.to_string()).collect();
        assert_eq!(order, vec!["bob", "alice"]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_deactivate_unknown_producer() {
        let mut table = ProducerTable::new();
        assert_eq!(
            table.deactivate(&name("ghost")),
            Err(GovernanceError::UnknownProducer(name("ghost")))
        );
    }

    #[test]
    fn test_serde_rebuilds_rank_index() {
        let mut table = ProducerTable::new();
        with_votes(&mut table, "alice", 5);
        with_votes(&mut table, "bob", 9);
        let json = serde_json::to_string(&table).unwrap();
        let restored: ProducerTable = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, table);
        assert_eq!(restored.iter_ranked().next().unwrap().owner, name("bob"));
    }
}
