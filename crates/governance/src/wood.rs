//! Wood (proof) ledger: consumed proofs and the vote aggregates built from them

use crate::types::{BlockStat, ProducerBlockStat, WoodBurn};
use celes_types::{BlockNum, Name};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

/// Host proof-of-work check.
pub trait ProofVerifier {
    fn verify(&self, block_number: BlockNum, owner: &Name, wood: &str) -> bool;
}

/// Numeric digest used to index proofs: the last 16 characters read as hex,
/// with non-hex characters counting as zero nibbles.
pub fn wood_key(wood: &str) -> u64 {
    let bytes = wood.as_bytes();
    let tail = &bytes[bytes.len().saturating_sub(16)..];
    tail.iter().fold(0u64, |acc, b| {
        let nibble = (*b as char).to_digit(16).unwrap_or(0) as u64;
        (acc << 4) | nibble
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct BurnRepr {
    next_id: u64,
    rows: Vec<WoodBurn>,
}

/// Consumed proofs, indexed by wood key and by block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BurnRepr", into = "BurnRepr")]
pub struct BurnTable {
    next_id: u64,
    rows: BTreeMap<u64, WoodBurn>,
    by_key: BTreeMap<u64, BTreeSet<u64>>,
    by_block: BTreeSet<(BlockNum, u64)>,
}

impl BurnTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&WoodBurn> {
        self.rows.get(&id)
    }

    /// True if this exact proof was already consumed for `block_number` by `owner`.
    pub fn contains(&self, wood: &str, block_number: BlockNum, owner: &Name) -> bool {
        self.by_key
            .get(&wood_key(wood))
            .into_iter()
            .flatten()
            .filter_map(|id| self.rows.get(id))
            .any(|row| row.block_number == block_number && row.owner == *owner && row.wood == wood)
    }

    pub fn insert(&mut self, owner: Name, block_number: BlockNum, wood: String) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.index(WoodBurn {
            id,
            owner,
            block_number,
            wood,
        });
        id
    }

    fn index(&mut self, row: WoodBurn) {
        self.by_key.entry(wood_key(&row.wood)).or_default().insert(row.id);
        self.by_block.insert((row.block_number, row.id));
        self.rows.insert(row.id, row);
    }

    pub fn remove(&mut self, id: u64) -> Option<WoodBurn> {
        let row = self.rows.remove(&id)?;
        let key = wood_key(&row.wood);
        if let Some(ids) = self.by_key.get_mut(&key) {
            ids.remove(&id);
            if ids.is_empty() {
                self.by_key.remove(&key);
            }
        }
        self.by_block.remove(&(row.block_number, id));
        Some(row)
    }

    /// Up to `limit` row ids with `block_number < before`, oldest first.
    pub fn ids_before(&self, before: BlockNum, limit: usize) -> Vec<u64> {
        self.by_block
            .range(..(before, 0))
            .take(limit)
            .map(|(_, id)| *id)
            .collect()
    }
}

impl From<BurnRepr> for BurnTable {
    fn from(repr: BurnRepr) -> Self {
        let mut table = BurnTable {
            next_id: repr.next_id,
            ..Default::default()
        };
        for row in repr.rows {
            table.next_id = table.next_id.max(row.id + 1);
            table.index(row);
        }
        table
    }
}

impl From<BurnTable> for BurnRepr {
    fn from(table: BurnTable) -> Self {
        BurnRepr {
            next_id: table.next_id,
            rows: table.rows.into_values().collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct StatRepr {
    next_id: u64,
    rows: Vec<ProducerBlockStat>,
}

/// Per-producer-per-block vote counts, indexed by (producer, block) and by block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StatRepr", into = "StatRepr")]
pub struct ProducerStatTable {
    next_id: u64,
    rows: BTreeMap<u64, ProducerBlockStat>,
    by_producer_block: BTreeMap<(Name, BlockNum), u64>,
    by_block: BTreeSet<(BlockNum, u64)>,
}

impl ProducerStatTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, producer: &Name, block_number: BlockNum) -> Option<&ProducerBlockStat> {
        self.by_producer_block
            .get(&(*producer, block_number))
            .and_then(|id| self.rows.get(id))
    }

    /// Add one vote for `producer` at `block_number`, creating the row if needed.
    pub fn increment(&mut self, producer: Name, block_number: BlockNum) -> u64 {
        if let Some(id) = self.by_producer_block.get(&(producer, block_number)) {
            if let Some(row) = self.rows.get_mut(id) {
                row.stat += 1;
                return row.stat;
            }
        }
        let id = self.next_id;
        self.next_id += 1;
        self.index(ProducerBlockStat {
            id,
            producer,
            block_number,
            stat: 1,
        });
        1
    }

    fn index(&mut self, row: ProducerBlockStat) {
        self.by_producer_block
            .insert((row.producer, row.block_number), row.id);
        self.by_block.insert((row.block_number, row.id));
        self.rows.insert(row.id, row);
    }

    pub fn remove(&mut self, id: u64) -> Option<ProducerBlockStat> {
        let row = self.rows.remove(&id)?;
        self.by_producer_block
            .remove(&(row.producer, row.block_number));
        self.by_block.remove(&(row.block_number, id));
        Some(row)
    }

    /// Up to `limit` row ids with `block_number < before`, oldest first.
    pub fn ids_before(&self, before: BlockNum, limit: usize) -> Vec<u64> {
        self.by_block
            .range(..(before, 0))
            .take(limit)
            .map(|(_, id)| *id)
            .collect()
    }

    /// Sum of votes recorded for `producer` in `[from, ..)`.
    pub fn votes_since(&self, producer: &Name, from: BlockNum) -> u64 {
        self.by_producer_block
            .range((
                Bound::Included((*producer, from)),
                Bound::Included((*producer, BlockNum::MAX)),
            ))
            .filter_map(|(_, id)| self.rows.get(id))
            .map(|row| row.stat)
            .sum()
    }
}

impl From<StatRepr> for ProducerStatTable {
    fn from(repr: StatRepr) -> Self {
        let mut table = ProducerStatTable {
            next_id: repr.next_id,
            ..Default::default()
        };
        for row in repr.rows {
            table.next_id = table.next_id.max(row.id + 1);
            table.index(row);
        }
        table
    }
}

impl From<ProducerStatTable> for StatRepr {
    fn from(table: ProducerStatTable) -> Self {
        StatRepr {
            next_id: table.next_id,
            rows: table.rows.into_values().collect(),
        }
    }
}

/// Everything recorded about submitted wood.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WoodLedger {
    pub burns: BurnTable,
    pub producer_stats: ProducerStatTable,
    /// Difficulty-period records keyed by the period's first block
    pub block_stats: BTreeMap<BlockNum, BlockStat>,
}

impl WoodLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one vote in the difficulty period starting at `period_start`.
    pub fn record_period_vote(&mut self, period_start: BlockNum, baseline_difficulty: f64) {
        self.block_stats
            .entry(period_start)
            .or_insert_with(|| BlockStat {
                block_number: period_start,
                stat: 0,
                diff: baseline_difficulty,
            })
            .stat += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> Name {
        Name::new(s).unwrap()
    }

    #[test]
    fn test_wood_key_reads_hex_tail() {
        assert_eq!(wood_key("ff"), 0xff);
        assert_eq!(wood_key("0123456789abcdef0123456789abcdef"), 0x0123_4567_89ab_cdef);
        // non-hex characters are zero nibbles
        assert_eq!(wood_key("zz1"), 0x001);
        assert_eq!(wood_key(""), 0);
    }

    #[test]
    fn test_burn_table_detects_exact_triple() {
        let mut burns = BurnTable::default();
        burns.insert(name("alice"), 10, "zbc1".into());

        assert!(burns.contains("zbc1", 10, &name("alice")));
        assert!(!burns.contains("zbc1", 11, &name("alice")));
        assert!(!burns.contains("zbc1", 10, &name("bob")));
        // same digest, different proof
        assert_eq!(wood_key("ybc1"), wood_key("zbc1"));
        assert!(!burns.contains("ybc1", 10, &name("alice")));
    }

    #[test]
    fn test_burn_table_range_and_remove() {
        let mut burns = BurnTable::default();
        let a = burns.insert(name("alice"), 5, "aa".into());
        let b = burns.insert(name("alice"), 7, "bb".into());
        burns.insert(name("alice"), 9, "cc".into());

        assert_eq!(burns.ids_before(9, 10), vec![a, b]);
        assert_eq!(burns.ids_before(9, 1), vec![a]);

        burns.remove(a).unwrap();
        assert!(!burns.contains("aa", 5, &name("alice")));
        assert_eq!(burns.ids_before(9, 10), vec![b]);
        assert!(burns.remove(a).is_none());
    }

    #[test]
    fn test_producer_stats_increment() {
        let mut stats = ProducerStatTable::default();
        assert_eq!(stats.increment(name("bp"), 3), 1);
        assert_eq!(stats.increment(name("bp"), 3), 2);
        stats.increment(name("bp"), 4);
        stats.increment(name("other"), 4);

        assert_eq!(stats.len(), 3);
        assert_eq!(stats.get(&name("bp"), 3).unwrap().stat, 2);
        assert_eq!(stats.votes_since(&name("bp"), 0), 3);
        assert_eq!(stats.votes_since(&name("bp"), 4), 1);
    }

    #[test]
    fn test_serde_keeps_row_ids_moving_forward() {
        let mut ledger = WoodLedger::new();
        ledger.burns.insert(name("alice"), 1, "aa".into());
        let second = ledger.burns.insert(name("alice"), 2, "bb".into());
        ledger.burns.remove(second);

        let json = serde_json::to_string(&ledger).unwrap();
        let mut restored: WoodLedger = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, ledger);
        assert_eq!(restored.burns.insert(name("bob"), 3, "cc".into()), 2);
    }
}
