//! System configuration
//!
//! Every parameter fixed at genesis, grouped the way the subsystems consume
//! them. All sections default, so a partial TOML file is enough.

use crate::errors::{Result, SystemError};
use celes_economics::EconomicsParams;
use celes_governance::GovernanceParams;
use celes_treasury::SystemAccounts;
use celes_types::{Symbol, MICROS_PER_DAY};
use serde::{Deserialize, Serialize};

/// Resource market and deferred-effect parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceParams {
    /// Denomination of resource units (base connector)
    pub ram_symbol: Symbol,
    /// Denomination of the relay token
    pub relay_symbol: Symbol,
    /// Delay before an unstake refund is paid out
    pub refund_delay_micros: u64,
    /// A new bid must beat the previous one by more than `1 / divisor` of it
    pub bid_increase_divisor: i64,
    /// Open bids idle for longer than this may be closed
    pub bid_idle_micros: u64,
    /// Upper bound accepted by `set_resource_max`
    pub max_ram_ceiling: u64,
}

impl Default for ResourceParams {
    fn default() -> Self {
        Self {
            ram_symbol: known_symbol("RAM", 0),
            relay_symbol: known_symbol("RAMCORE", 4),
            refund_delay_micros: 3 * MICROS_PER_DAY,
            bid_increase_divisor: 10,
            bid_idle_micros: MICROS_PER_DAY,
            // 1 PiB
            max_ram_ceiling: 1 << 50,
        }
    }
}

fn known_symbol(code: &str, precision: u8) -> Symbol {
    Symbol::new(code, precision).unwrap_or(Symbol::from_raw(0))
}

/// Complete configuration of a system core instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub governance: GovernanceParams,
    pub economics: EconomicsParams,
    pub accounts: SystemAccounts,
    pub resources: ResourceParams,
}

impl SystemConfig {
    pub fn validate(&self) -> Result<()> {
        self.governance.validate()?;
        self.economics.validate()?;

        let resources = &self.resources;
        if resources.ram_symbol == resources.relay_symbol {
            return Err(SystemError::InvalidConfig(
                "resource and relay symbols must differ".to_string(),
            ));
        }
        if resources.bid_increase_divisor <= 0 {
            return Err(SystemError::InvalidConfig(
                "bid_increase_divisor must be positive".to_string(),
            ));
        }

        let accounts = &self.accounts;
        let named = [
            accounts.system,
            accounts.block_pay_pool,
            accounts.block_pay,
            accounts.wood_pay_pool,
            accounts.wood_pay,
            accounts.dapp_pay_pool,
            accounts.dapp_pay,
            accounts.ram,
            accounts.ram_fee,
            accounts.stake,
            accounts.names,
            accounts.dbp,
        ];
        if named.iter().any(|name| name.is_empty()) {
            return Err(SystemError::InvalidConfig(
                "system account names must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
