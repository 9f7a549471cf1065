//! Row types for the governance tables

use celes_types::{BlockNum, Name, PublicKey, TimePoint};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// A registered block producer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerInfo {
    pub owner: Name,
    /// Live election weight; one per accepted vote, decayed by the compactor
    pub total_votes: u64,
    pub producer_key: PublicKey,
    pub is_active: bool,
    pub url: String,
    pub location: u16,
    /// Block-pay emission credited while producing, not yet claimed
    pub unpaid_block_fee: u64,
    /// Votes received whose wood fee has not been claimed yet
    pub unpaid_wood: u64,
    pub last_claim_time: TimePoint,
}

impl ProducerInfo {
    pub fn new(owner: Name, producer_key: PublicKey, url: String, location: u16) -> Self {
        Self {
            owner,
            total_votes: 0,
            producer_key,
            is_active: true,
            url,
            location,
            unpaid_block_fee: 0,
            unpaid_wood: 0,
            last_claim_time: TimePoint::ZERO,
        }
    }

    pub fn rank_key(&self) -> RankKey {
        RankKey::of(self.is_active, self.total_votes)
    }

    /// Clear the signing key and mark inactive. Vote history is kept.
    pub fn deactivate(&mut self) {
        self.producer_key = PublicKey::EMPTY;
        self.is_active = false;
    }
}

/// Election ranking of a producer.
///
/// Ordered as the tuple `(inactive, weight)`: every active producer sorts
/// before every inactive one, active producers by descending weight and
/// inactive producers by ascending weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RankKey {
    Active(Reverse<u64>),
    Inactive(u64),
}

impl RankKey {
    pub fn of(is_active: bool, weight: u64) -> Self {
        if is_active {
            RankKey::Active(Reverse(weight))
        } else {
            RankKey::Inactive(weight)
        }
    }
}

/// Voter record holding proxy delegation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterInfo {
    pub owner: Name,
    /// Account allowed to submit this voter's wood, or empty
    pub proxy: Name,
    pub is_proxy: bool,
}

impl VoterInfo {
    pub fn new(owner: Name) -> Self {
        Self {
            owner,
            proxy: Name::EMPTY,
            is_proxy: false,
        }
    }
}

/// Dapp block producer (auxiliary payee)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbpInfo {
    pub owner: Name,
    pub url: String,
    pub steem_id: String,
    pub last_claim_time: TimePoint,
}

/// One consumed proof
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WoodBurn {
    pub id: u64,
    pub owner: Name,
    pub block_number: BlockNum,
    pub wood: String,
}

/// Votes one producer received for proofs of one block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerBlockStat {
    pub id: u64,
    pub producer: Name,
    pub block_number: BlockNum,
    pub stat: u64,
}

/// Difficulty-period record: votes observed and the difficulty in force
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockStat {
    pub block_number: BlockNum,
    pub stat: u64,
    pub diff: f64,
}

/// One slot of a published producer schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub producer: Name,
    pub key: PublicKey,
    pub location: u16,
}
