use celes_types::{Asset, AssetError, Name};
use thiserror::Error;

/// Errors reported by a token ledger
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("overdrawn balance: {account} holds {available}, needs {needed}")]
    InsufficientBalance {
        account: Name,
        available: Asset,
        needed: Asset,
    },

    #[error("must transfer positive quantity, got {0}")]
    NonPositiveQuantity(Asset),

    #[error("cannot transfer to self: {0}")]
    SelfTransfer(Name),

    #[error("memo has more than 256 bytes")]
    MemoTooLong,

    /// Failure reported by the backing ledger itself
    #[error("transfer rejected: {0}")]
    Rejected(String),

    #[error(transparent)]
    Asset(#[from] AssetError),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
