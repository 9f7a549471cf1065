use crate::errors::{GovernanceError, Result};
use celes_types::BlockNum;
use serde::{Deserialize, Serialize};

/// Governance parameters fixed at genesis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceParams {
    /// Size of a full producer slate
    pub bp_count: usize,
    /// Consecutive full-slate elections required to activate the network
    pub active_network_cycle: u16,
    /// Blocks between elections
    pub singing_ticker_sep: BlockNum,
    /// Blocks per difficulty period
    pub difficulty_period: BlockNum,
    /// Blocks a vote keeps counting towards election weight
    pub retention_period: BlockNum,
    /// Expected votes per difficulty period
    pub target_wood_number: u32,
    /// Blocks between network activation and DBP activation
    pub dbp_active_sep: BlockNum,
    /// Difficulty floor
    pub min_difficulty: f64,
    /// Difficulty assumed for periods with no record
    pub baseline_difficulty: f64,
    pub max_url_len: usize,
    pub max_wood_len: usize,
    /// Rows each opportunistic compaction pass may delete
    pub compaction_quota: u32,
    /// Blocks before an election in which expiring stats are pre-cleaned
    pub pre_election_window: BlockNum,
}

impl Default for GovernanceParams {
    fn default() -> Self {
        let bp_count = 9;
        Self {
            bp_count,
            active_network_cycle: 24,
            singing_ticker_sep: bp_count as BlockNum * 6 * 60,
            difficulty_period: 120,
            retention_period: bp_count as BlockNum * 6 * 60,
            target_wood_number: 300,
            dbp_active_sep: 3 * 24 * 60 * 60 * 2,
            min_difficulty: 0.0001,
            baseline_difficulty: 1.0,
            max_url_len: 512,
            max_wood_len: 512,
            compaction_quota: 5,
            pre_election_window: 30,
        }
    }
}

impl GovernanceParams {
    pub fn validate(&self) -> Result<()> {
        if self.bp_count == 0 || self.bp_count > u16::MAX as usize {
            return Err(GovernanceError::InvalidParameter(
                "bp_count must be between 1 and 65535",
            ));
        }
        if self.singing_ticker_sep == 0 {
            return Err(GovernanceError::InvalidParameter(
                "singing_ticker_sep must be positive",
            ));
        }
        if self.difficulty_period == 0 {
            return Err(GovernanceError::InvalidParameter(
                "difficulty_period must be positive",
            ));
        }
        if self.target_wood_number == 0 {
            return Err(GovernanceError::InvalidParameter(
                "target_wood_number must be positive",
            ));
        }
        if !(self.min_difficulty > 0.0) || !(self.baseline_difficulty > 0.0) {
            return Err(GovernanceError::InvalidParameter(
                "difficulty bounds must be positive",
            ));
        }
        Ok(())
    }

    /// First block whose per-producer stats still count towards election
    /// weight, or `None` while the chain is younger than one retention period.
    pub fn retention_cutoff(&self, head: BlockNum) -> Option<BlockNum> {
        if head > self.retention_period {
            Some(head - self.retention_period)
        } else {
            None
        }
    }
}
