//! The singleton record shared by every subsystem of the system core.

use crate::time::{BlockNum, TimePoint};
use serde::{Deserialize, Serialize};

/// Default total resource units (64 GiB).
pub const DEFAULT_MAX_RAM_SIZE: u64 = 64 * 1024 * 1024 * 1024;

/// Global resource, election, and reward bookkeeping.
///
/// Every transition reads and writes this record; it is owned by the
/// transition engine and passed down by mutable reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalState {
    /// Total resource units the network offers.
    pub max_ram_size: u64,
    /// Resource units currently owned by accounts.
    pub total_ram_bytes_reserved: u64,
    /// Core tokens held by the resource pool on behalf of buyers.
    pub total_ram_stake: i64,

    pub last_producer_schedule_block: BlockNum,
    pub last_producer_schedule_size: u16,
    /// Block-pay emission credited to producers but not yet claimed.
    pub total_unpaid_block_fee: u64,
    /// Accepted votes whose wood fee has not been claimed yet.
    pub total_unpaid_wood: u64,
    /// Sum of live producer vote weight.
    pub total_producer_vote_weight: u64,
    /// Cumulative count of accepted votes.
    pub total_activated_stake: u64,

    pub last_name_close: TimePoint,

    pub is_network_active: bool,
    /// Consecutive elections that found a full slate before activation.
    pub active_touch_count: u16,
    pub network_active_block: BlockNum,

    pub new_ram_per_block: u16,
    pub last_ram_increase_block: BlockNum,

    pub total_dbp_count: u32,
    pub is_dbp_active: bool,
    pub dbp_active_block: BlockNum,

    /// Upgrade marker; only ever moves forward one step at a time.
    pub revision: u8,
}

impl Default for GlobalState {
    fn default() -> Self {
        Self {
            max_ram_size: DEFAULT_MAX_RAM_SIZE,
            total_ram_bytes_reserved: 0,
            total_ram_stake: 0,
            last_producer_schedule_block: 0,
            last_producer_schedule_size: 0,
            total_unpaid_block_fee: 0,
            total_unpaid_wood: 0,
            total_producer_vote_weight: 0,
            total_activated_stake: 0,
            last_name_close: TimePoint::ZERO,
            is_network_active: false,
            active_touch_count: 0,
            network_active_block: 0,
            new_ram_per_block: 1024,
            last_ram_increase_block: 0,
            total_dbp_count: 0,
            is_dbp_active: false,
            dbp_active_block: 0,
            revision: 0,
        }
    }
}

impl GlobalState {
    /// Resource units not yet sold.
    pub fn free_ram(&self) -> u64 {
        self.max_ram_size
            .saturating_sub(self.total_ram_bytes_reserved)
    }

    /// Latch the network into the active state. Never reverts.
    pub fn latch_network_active(&mut self, head_block: BlockNum) {
        if !self.is_network_active {
            self.is_network_active = true;
            self.network_active_block = head_block;
        }
    }
}
