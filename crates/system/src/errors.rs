//! Error types for the system core

use crate::host::HostError;
use celes_economics::{EconomicsError, ExchangeError};
use celes_governance::GovernanceError;
use celes_treasury::LedgerError;
use celes_types::{Asset, AssetError, Name};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Broad classes of failure, as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed input, rejected before any mutation
    Validation,
    /// Referenced record does not exist
    NotFound,
    /// Request conflicts with current state
    StateConflict,
    /// A collaborator call failed; the transition was rolled back
    ExternalCall,
    /// The signer lacks the required authority
    Unauthorized,
}

/// Errors that can occur while applying an action
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SystemError {
    #[error(transparent)]
    Governance(#[from] GovernanceError),

    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    #[error(transparent)]
    Economics(#[from] EconomicsError),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error("missing authority of {0}")]
    MissingAuthority(Name),

    #[error("system contract must first be initialized")]
    NotInitialized,

    #[error("system contract is already initialized")]
    AlreadyInitialized,

    #[error("network is not active")]
    NetworkInactive,

    #[error("dbp is already active")]
    DbpAlreadyActive,

    #[error("{0} is neither an active producer nor a dbp")]
    NotClaimant(Name),

    #[error("already claimed rewards within past {cooldown_secs} seconds or punished")]
    TooSoon { owner: Name, cooldown_secs: u64 },

    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("insufficient funds: {account} holds {available}, needs {needed}")]
    InsufficientFunds {
        account: Name,
        available: Asset,
        needed: Asset,
    },

    #[error("insufficient resource: {account} holds {held} units, {requested} requested")]
    InsufficientResource {
        account: Name,
        held: u64,
        requested: u64,
    },

    #[error("insufficient stake: {account} staked {staked}, {requested} requested")]
    InsufficientStake {
        account: Name,
        staked: Asset,
        requested: Asset,
    },

    #[error("invalid resource size: {0}")]
    InvalidResourceSize(String),

    #[error("revision must advance by exactly one: current {current}, requested {requested}")]
    InvalidRevision { current: u8, requested: u8 },

    #[error("name bid rejected: {0}")]
    BidRejected(String),

    #[error("reserved account: {0}")]
    ReservedAccount(Name),

    #[error("token transfer failed: {0}")]
    Ledger(#[from] LedgerError),

    #[error("schedule publication failed: {0}")]
    Publish(HostError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SystemError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SystemError::Governance(err) if err.is_validation() => ErrorKind::Validation,
            SystemError::Governance(err) if err.is_not_found() => ErrorKind::NotFound,
            SystemError::Governance(_) => ErrorKind::StateConflict,
            SystemError::Exchange(ExchangeError::InvalidMarket) => ErrorKind::NotFound,
            SystemError::Exchange(ExchangeError::InvalidAsset { .. })
            | SystemError::Exchange(ExchangeError::NegativeAmount)
            | SystemError::Exchange(ExchangeError::Asset(_)) => ErrorKind::Validation,
            SystemError::Exchange(_) => ErrorKind::StateConflict,
            SystemError::Economics(_)
            | SystemError::Asset(_)
            | SystemError::InvalidQuantity(_)
            | SystemError::InvalidResourceSize(_)
            | SystemError::InvalidRevision { .. }
            | SystemError::ReservedAccount(_)
            | SystemError::InvalidConfig(_) => ErrorKind::Validation,
            SystemError::NotClaimant(_) => ErrorKind::NotFound,
            SystemError::NotInitialized
            | SystemError::AlreadyInitialized
            | SystemError::NetworkInactive
            | SystemError::DbpAlreadyActive
            | SystemError::TooSoon { .. }
            | SystemError::InsufficientFunds { .. }
            | SystemError::InsufficientResource { .. }
            | SystemError::InsufficientStake { .. }
            | SystemError::BidRejected(_) => ErrorKind::StateConflict,
            SystemError::MissingAuthority(_) => ErrorKind::Unauthorized,
            SystemError::Ledger(_) | SystemError::Publish(_) => ErrorKind::ExternalCall,
        }
    }
}

/// Result type for system operations
pub type Result<T> = std::result::Result<T, SystemError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let bp = Name::new("bp").unwrap();
        assert_eq!(
            SystemError::from(GovernanceError::EmptyProof).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            SystemError::from(GovernanceError::UnknownProducer(bp)).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            SystemError::from(GovernanceError::DuplicateProof {
                wood: "aa".into(),
                block_number: 1,
                owner: bp,
            })
            .kind(),
            ErrorKind::StateConflict
        );
        assert_eq!(
            SystemError::from(ExchangeError::InvalidMarket).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(SystemError::MissingAuthority(bp).kind(), ErrorKind::Unauthorized);
        assert_eq!(
            SystemError::Publish(HostError::new("down")).kind(),
            ErrorKind::ExternalCall
        );
    }

    #[test]
    fn test_messages_are_readable() {
        let err = SystemError::TooSoon {
            owner: Name::new("bp").unwrap(),
            cooldown_secs: 21_600,
        };
        assert_eq!(
            err.to_string(),
            "already claimed rewards within past 21600 seconds or punished"
        );
    }
}
