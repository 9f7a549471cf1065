//! Constant-product resource exchange
//!
//! A 50/50 relay between the scarce resource (base connector) and the core
//! token (quote connector). Conversions are pure functions of the pool state:
//! no ledger access and no side effects beyond updating the connector balances.

use crate::errors::ExchangeError;
use celes_types::{Asset, Symbol};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fixed connector weight of the relay.
pub const CONNECTOR_WEIGHT: f64 = 0.5;

/// Initial relay-token supply minted at genesis.
pub const INITIAL_RELAY_SUPPLY: i64 = 100_000_000_000_000;

pub type Result<T> = std::result::Result<T, ExchangeError>;

/// One side of the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    pub balance: Asset,
    pub weight: f64,
}

impl Connector {
    fn new(balance: Asset) -> Self {
        Self {
            balance,
            weight: CONNECTOR_WEIGHT,
        }
    }
}

/// Two-asset liquidity pool state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolState {
    /// Relay token supply. A direct base/quote swap mints and burns the same
    /// relay amount, so it is unchanged by [`PoolState::convert`].
    pub supply: Asset,
    pub base: Connector,
    pub quote: Connector,
}

impl PoolState {
    pub fn new(supply: Asset, base: Asset, quote: Asset) -> Result<Self> {
        if supply.amount <= 0 {
            return Err(ExchangeError::InvalidPool("relay supply must be positive"));
        }
        if base.amount <= 0 || quote.amount <= 0 {
            return Err(ExchangeError::InvalidPool(
                "connector balances must be positive",
            ));
        }
        if base.symbol == quote.symbol {
            return Err(ExchangeError::InvalidPool(
                "connectors must hold different symbols",
            ));
        }

        Ok(Self {
            supply,
            base: Connector::new(base),
            quote: Connector::new(quote),
        })
    }

    /// Amount `from` would buy of `to` without touching the pool.
    pub fn quote_conversion(&self, from: Asset, to: Symbol) -> Result<Asset> {
        let (input, output) = self.sides(from.symbol, to)?;
        let out = constant_product_out(input.balance.amount, output.balance.amount, from.amount)?;
        Ok(Asset::new(out, to))
    }

    /// Convert `from` into the opposite connector's symbol `to`.
    ///
    /// The input is added to the matching connector and the output removed
    /// from the other one.
    pub fn convert(&mut self, from: Asset, to: Symbol) -> Result<Asset> {
        let out = self.quote_conversion(from, to)?;

        let (input, output) = if from.symbol == self.base.balance.symbol {
            (&mut self.base, &mut self.quote)
        } else {
            (&mut self.quote, &mut self.base)
        };
        input.balance = input.balance.checked_add(from)?;
        output.balance = output.balance.checked_sub(out)?;

        debug!(
            target: "exchange",
            "converted {} into {} (base={}, quote={})",
            from, out, self.base.balance, self.quote.balance
        );

        Ok(out)
    }

    /// Grow the base connector, used when new resource units come online.
    pub fn add_base_liquidity(&mut self, units: i64) -> Result<()> {
        if units < 0 {
            return Err(ExchangeError::NegativeAmount);
        }
        self.base.balance = self
            .base
            .balance
            .checked_add(Asset::new(units, self.base.balance.symbol))?;
        Ok(())
    }

    fn sides(&self, from: Symbol, to: Symbol) -> Result<(&Connector, &Connector)> {
        let base = self.base.balance.symbol;
        let quote = self.quote.balance.symbol;
        if from == base && to == quote {
            Ok((&self.base, &self.quote))
        } else if from == quote && to == base {
            Ok((&self.quote, &self.base))
        } else {
            Err(ExchangeError::InvalidAsset { from, to })
        }
    }
}

/// Output of a constant-product swap:
/// `balance_out - balance_in * balance_out / (balance_in + amount_in)`,
/// truncated towards zero.
///
/// Evaluated as `balance_out * amount_in / (balance_in + amount_in)`, which is
/// the same real number, so a single integer division gives the exact floor.
pub fn constant_product_out(balance_in: i64, balance_out: i64, amount_in: i64) -> Result<i64> {
    if balance_in <= 0 || balance_out <= 0 {
        return Err(ExchangeError::InvalidPool(
            "connector balances must be positive",
        ));
    }
    if amount_in < 0 {
        return Err(ExchangeError::NegativeAmount);
    }

    let numerator = (balance_out as u128)
        .checked_mul(amount_in as u128)
        .ok_or(ExchangeError::CalculationOverflow("swap numerator"))?;
    let denominator = (balance_in as u128) + (amount_in as u128);
    let out = numerator / denominator;

    i64::try_from(out).map_err(|_| ExchangeError::CalculationOverflow("swap output"))
}

/// Trading fee on a resource purchase or sale: 0.5% rounded up by default.
pub fn resource_fee(amount: i64, divisor: u64) -> i64 {
    if amount <= 0 || divisor == 0 {
        return 0;
    }
    let divisor = divisor as i64;
    (amount + divisor - 1) / divisor
}

/// The resource market: a pool that may not exist yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceMarket {
    pool: Option<PoolState>,
}

impl ResourceMarket {
    pub fn new() -> Self {
        Self { pool: None }
    }

    pub fn is_initialized(&self) -> bool {
        self.pool.is_some()
    }

    /// Create the pool once at genesis.
    pub fn initialize(&mut self, pool: PoolState) -> Result<()> {
        if self.pool.is_some() {
            return Err(ExchangeError::MarketAlreadyInitialized);
        }
        self.pool = Some(pool);
        Ok(())
    }

    pub fn pool(&self) -> Result<&PoolState> {
        self.pool.as_ref().ok_or(ExchangeError::InvalidMarket)
    }

    pub fn pool_mut(&mut self) -> Result<&mut PoolState> {
        self.pool.as_mut().ok_or(ExchangeError::InvalidMarket)
    }

    pub fn convert(&mut self, from: Asset, to: Symbol) -> Result<Asset> {
        self.pool_mut()?.convert(from, to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ram() -> Symbol {
        Symbol::new("RAM", 0).unwrap()
    }

    fn core() -> Symbol {
        Symbol::new("CELES", 4).unwrap()
    }

    fn relay() -> Symbol {
        Symbol::new("RAMCORE", 4).unwrap()
    }

    fn pool(base: i64, quote: i64) -> PoolState {
        PoolState::new(
            Asset::new(INITIAL_RELAY_SUPPLY, relay()),
            Asset::new(base, ram()),
            Asset::new(quote, core()),
        )
        .unwrap()
    }

    #[test]
    fn million_pool_scenario_matches_formula() {
        let mut pool = pool(1_000_000, 1_000_000);
        let out = pool.convert(Asset::new(1000, ram()), core()).unwrap();

        // floor(1_000_000 - 10^12 / 1_001_000) = floor(999.000999...)
        assert_eq!(out, Asset::new(999, core()));
        assert_eq!(pool.base.balance.amount, 1_001_000);
        assert_eq!(pool.quote.balance.amount, 999_001);
        assert_eq!(pool.supply.amount, INITIAL_RELAY_SUPPLY);
    }

    #[test]
    fn converts_in_both_directions() {
        let mut pool = pool(1_000_000, 500_000);
        let bytes = pool.convert(Asset::new(10_000, core()), ram()).unwrap();
        assert_eq!(bytes.symbol, ram());
        assert_eq!(bytes.amount, 1_000_000 * 10_000 / 510_000);
        assert_eq!(pool.quote.balance.amount, 510_000);
        assert_eq!(pool.base.balance.amount, 1_000_000 - bytes.amount);
    }

    #[test]
    fn unknown_denomination_is_invalid_asset() {
        let mut pool = pool(1_000, 1_000);
        let err = pool.convert(Asset::new(10, relay()), core()).unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidAsset { .. }));

        let err = pool.convert(Asset::new(10, core()), core()).unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidAsset { .. }));
    }

    #[test]
    fn missing_pool_is_invalid_market() {
        let mut market = ResourceMarket::new();
        let err = market.convert(Asset::new(10, core()), ram()).unwrap_err();
        assert_eq!(err, ExchangeError::InvalidMarket);

        market.initialize(pool(10, 10)).unwrap();
        assert_eq!(
            market.initialize(pool(10, 10)),
            Err(ExchangeError::MarketAlreadyInitialized)
        );
    }

    #[test]
    fn pool_requires_positive_balances() {
        assert!(PoolState::new(
            Asset::new(1, relay()),
            Asset::new(0, ram()),
            Asset::new(1, core())
        )
        .is_err());
    }

    #[test]
    fn fee_rounds_up() {
        assert_eq!(resource_fee(1, 200), 1);
        assert_eq!(resource_fee(200, 200), 1);
        assert_eq!(resource_fee(201, 200), 2);
        assert_eq!(resource_fee(0, 200), 0);
    }

    proptest! {
        #[test]
        fn output_is_monotonic_and_bounded(
            balance_in in 1i64..1_000_000_000_000,
            balance_out in 1i64..1_000_000_000_000,
            amount in 0i64..1_000_000_000_000,
            extra in 0i64..1_000_000_000,
        ) {
            let smaller = constant_product_out(balance_in, balance_out, amount).unwrap();
            let larger = constant_product_out(balance_in, balance_out, amount + extra).unwrap();
            prop_assert!(smaller <= larger);
            prop_assert!(larger < balance_out);
        }
    }
}
