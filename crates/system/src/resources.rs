//! Genesis, resource trading and resource supply growth

use crate::contract::Transition;
use crate::errors::{Result, SystemError};
use celes_economics::{resource_fee, PoolState, INITIAL_RELAY_SUPPLY};
use celes_types::{Asset, Name, Symbol};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Result of a resource purchase or sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTrade {
    pub account: Name,
    /// Resource units bought or sold
    pub units: u64,
    /// Core tokens paid into or out of the pool, fee excluded
    pub tokens: Asset,
    pub fee: Asset,
}

impl Transition<'_> {
    /// Create the resource market. Only ever succeeds once.
    pub(crate) fn init(&mut self, signer: Name, core_symbol: Symbol, quote_balance: i64) -> Result<()> {
        self.require_system(signer)?;
        if self.state.core_symbol.is_some() || self.state.market.is_initialized() {
            return Err(SystemError::AlreadyInitialized);
        }
        let resources = &self.config.resources;
        if core_symbol == resources.ram_symbol || core_symbol == resources.relay_symbol {
            return Err(SystemError::InvalidQuantity(format!(
                "{} cannot be the core symbol",
                core_symbol
            )));
        }
        let free = i64::try_from(self.state.global.free_ram())
            .map_err(|_| SystemError::InvalidResourceSize("free units exceed i64".to_string()))?;

        let pool = PoolState::new(
            Asset::new(INITIAL_RELAY_SUPPLY, resources.relay_symbol),
            Asset::new(free, resources.ram_symbol),
            Asset::new(quote_balance, core_symbol),
        )?;
        self.state.market.initialize(pool)?;
        self.state.core_symbol = Some(core_symbol);
        self.state.global.last_ram_increase_block = self.head;
        info!(
            target: "exchange",
            "resource market initialised: {} units against {}",
            free,
            Asset::new(quote_balance, core_symbol)
        );
        Ok(())
    }

    pub(crate) fn buy_resource(
        &mut self,
        signer: Name,
        payer: Name,
        receiver: Name,
        quantity: Asset,
    ) -> Result<ResourceTrade> {
        self.require_auth(signer, payer)?;
        let quantity = self.core_quantity(quantity)?;
        self.require_funds(payer, quantity)?;

        let fee = Asset::new(
            resource_fee(quantity.amount, self.config.economics.resource_fee_divisor),
            quantity.symbol,
        );
        let after_fee = quantity.checked_sub(fee)?;
        if after_fee.amount <= 0 {
            return Err(SystemError::InvalidQuantity(format!(
                "{} does not cover the trading fee",
                quantity
            )));
        }

        let ram_symbol = self.config.resources.ram_symbol;
        let bought = self.state.market.convert(after_fee, ram_symbol)?;
        if bought.amount <= 0 {
            return Err(SystemError::InvalidQuantity(format!(
                "{} buys no resource units",
                after_fee
            )));
        }
        let units = bought.amount as u64;

        let global = &mut self.state.global;
        global.total_ram_bytes_reserved = global.total_ram_bytes_reserved.saturating_add(units);
        global.total_ram_stake = global.total_ram_stake.saturating_add(after_fee.amount);
        let held = self.state.resources.entry(receiver).or_insert(0);
        *held = held.saturating_add(units);

        let accounts = &self.config.accounts;
        let (ram, ram_fee) = (accounts.ram, accounts.ram_fee);
        self.transfer(payer, ram, after_fee, "buy ram");
        if fee.amount > 0 {
            self.transfer(payer, ram_fee, fee, "ram fee");
        }
        debug!(target: "exchange", "{} bought {} units for {}", receiver, units, after_fee);
        Ok(ResourceTrade {
            account: receiver,
            units,
            tokens: after_fee,
            fee,
        })
    }

    pub(crate) fn sell_resource(&mut self, signer: Name, account: Name, units: u64) -> Result<ResourceTrade> {
        self.require_auth(signer, account)?;
        let core_symbol = self.core_symbol()?;
        if units == 0 {
            return Err(SystemError::InvalidQuantity(
                "cannot sell zero units".to_string(),
            ));
        }
        let held = self.state.resource_of(&account);
        if held < units {
            return Err(SystemError::InsufficientResource {
                account,
                held,
                requested: units,
            });
        }
        let amount = i64::try_from(units)
            .map_err(|_| SystemError::InvalidQuantity(format!("{} units", units)))?;

        let ram_symbol = self.config.resources.ram_symbol;
        let tokens = self
            .state
            .market
            .convert(Asset::new(amount, ram_symbol), core_symbol)?;
        if tokens.amount <= 0 {
            return Err(SystemError::InvalidQuantity(format!(
                "{} units sell for nothing",
                units
            )));
        }
        let global = &mut self.state.global;
        if global.total_ram_stake < tokens.amount {
            return Err(SystemError::InvalidQuantity(
                "attempt to unstake more tokens than previously staked".to_string(),
            ));
        }
        global.total_ram_stake -= tokens.amount;
        global.total_ram_bytes_reserved = global.total_ram_bytes_reserved.saturating_sub(units);
        if held == units {
            self.state.resources.remove(&account);
        } else {
            self.state.resources.insert(account, held - units);
        }

        let fee = Asset::new(
            resource_fee(tokens.amount, self.config.economics.resource_fee_divisor),
            core_symbol,
        );
        let accounts = &self.config.accounts;
        let (ram, ram_fee) = (accounts.ram, accounts.ram_fee);
        self.transfer(ram, account, tokens, "sell ram");
        if fee.amount > 0 {
            self.transfer(account, ram_fee, fee, "sell ram fee");
        }
        debug!(target: "exchange", "{} sold {} units for {}", account, units, tokens);
        Ok(ResourceTrade {
            account,
            units,
            tokens,
            fee,
        })
    }

    /// Resize the resource supply; the pool's base connector moves by the same amount.
    pub(crate) fn set_resource_max(&mut self, signer: Name, max_ram_size: u64) -> Result<()> {
        self.require_system(signer)?;
        if max_ram_size >= self.config.resources.max_ram_ceiling {
            return Err(SystemError::InvalidResourceSize(format!(
                "{} units is unrealistic",
                max_ram_size
            )));
        }
        let global = &self.state.global;
        if max_ram_size <= global.total_ram_bytes_reserved {
            return Err(SystemError::InvalidResourceSize(format!(
                "{} is not above the {} units already reserved",
                max_ram_size, global.total_ram_bytes_reserved
            )));
        }

        let delta = max_ram_size as i128 - global.max_ram_size as i128;
        if let Ok(pool) = self.state.market.pool_mut() {
            let base = pool.base.balance.amount as i128 + delta;
            if base <= 0 {
                return Err(SystemError::InvalidResourceSize(
                    "pool would run out of resource units".to_string(),
                ));
            }
            // |delta| is bounded by the ceiling, so the sum fits
            pool.base.balance.amount = base as i64;
        }
        self.state.global.max_ram_size = max_ram_size;
        info!(target: "exchange", "resource supply set to {} units", max_ram_size);
        Ok(())
    }

    pub(crate) fn set_resource_rate(&mut self, signer: Name, units_per_block: u16) -> Result<()> {
        self.require_system(signer)?;
        self.grow_resource_supply()?;
        self.state.global.new_ram_per_block = units_per_block;
        info!(target: "exchange", "resource supply grows {} units per block", units_per_block);
        Ok(())
    }

    /// Add `new_ram_per_block` units for every block since the last growth.
    pub(crate) fn grow_resource_supply(&mut self) -> Result<u64> {
        let global = &mut self.state.global;
        if self.head <= global.last_ram_increase_block {
            return Ok(0);
        }
        let elapsed = (self.head - global.last_ram_increase_block) as u64;
        let added = elapsed.saturating_mul(global.new_ram_per_block as u64);
        global.last_ram_increase_block = self.head;
        if added == 0 {
            return Ok(0);
        }
        global.max_ram_size = global.max_ram_size.saturating_add(added);
        if self.state.market.is_initialized() {
            let units = i64::try_from(added)
                .map_err(|_| SystemError::InvalidResourceSize(format!("{} units", added)))?;
            self.state.market.pool_mut()?.add_base_liquidity(units)?;
        }
        Ok(added)
    }
}
