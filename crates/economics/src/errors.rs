use celes_types::{AssetError, Symbol};
use thiserror::Error;

/// Errors raised by the resource exchange.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExchangeError {
    #[error("resource market has not been initialized")]
    InvalidMarket,

    #[error("resource market is already initialized")]
    MarketAlreadyInitialized,

    #[error("asset {from} cannot be converted into {to} by this market")]
    InvalidAsset { from: Symbol, to: Symbol },

    #[error("invalid pool: {0}")]
    InvalidPool(&'static str),

    #[error("conversion amount must not be negative")]
    NegativeAmount,

    #[error("arithmetic overflow while converting: {0}")]
    CalculationOverflow(&'static str),

    #[error(transparent)]
    Asset(#[from] AssetError),
}

/// Errors that can occur while computing emissions and reward payouts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EconomicsError {
    #[error("invalid economics parameter: {0}")]
    InvalidParameter(&'static str),

    #[error("arithmetic overflow while performing economics calculation: {0}")]
    CalculationOverflow(&'static str),
}
