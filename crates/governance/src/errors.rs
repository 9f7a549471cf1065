//! Error types for the Governance module

use celes_types::{BlockNum, Name};
use thiserror::Error;

/// Errors that can occur in the Governance module
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GovernanceError {
    /// Producer key is the empty sentinel
    #[error("public key should not be the default value")]
    InvalidKey,

    /// Producer url exceeds the allowed length
    #[error("url too long: {len} bytes (max {max})")]
    UrlTooLong { len: usize, max: usize },

    /// Account name is required but empty
    #[error("{0} must not be empty")]
    EmptyName(&'static str),

    /// Producer not registered
    #[error("producer not found: {0}")]
    UnknownProducer(Name),

    /// Producer exists but has been deactivated
    #[error("producer is not active: {0}")]
    InactiveProducer(Name),

    /// Proof string is empty
    #[error("wood should not be empty")]
    EmptyProof,

    /// Proof string exceeds the allowed length
    #[error("wood too long: {len} bytes (max {max})")]
    ProofTooLong { len: usize, max: usize },

    /// Proof already consumed for this block and owner
    #[error("wood already used: {wood} at block {block_number} by {owner}")]
    DuplicateProof {
        wood: String,
        block_number: BlockNum,
        owner: Name,
    },

    /// Proof rejected by the proof-of-work verifier
    #[error("invalid wood for block {block_number} owned by {owner}")]
    InvalidProof { block_number: BlockNum, owner: Name },

    /// Delegated proof owner has not delegated to the voter
    #[error("{owner} has not delegated to {voter}")]
    DelegationMismatch { owner: Name, voter: Name },

    /// Voter record missing
    #[error("voter not found: {0}")]
    VoterNotFound(Name),

    /// Proxy registration or assignment conflict
    #[error("proxy conflict: {0}")]
    ProxyConflict(String),

    /// Requested change would not modify anything
    #[error("action has no effect: {0}")]
    NoEffect(&'static str),

    /// Account has no outstanding punishment
    #[error("{0} is not punished")]
    NotPunished(Name),

    /// DBP not registered
    #[error("dbp not found: {0}")]
    UnknownDbp(Name),

    /// Invalid governance parameter
    #[error("invalid governance parameter: {0}")]
    InvalidParameter(&'static str),
}

impl GovernanceError {
    /// True for malformed input rejected before any lookup.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            GovernanceError::InvalidKey
                | GovernanceError::UrlTooLong { .. }
                | GovernanceError::EmptyName(_)
                | GovernanceError::EmptyProof
                | GovernanceError::ProofTooLong { .. }
                | GovernanceError::InvalidProof { .. }
                | GovernanceError::InvalidParameter(_)
        )
    }

    /// True when a referenced record does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            GovernanceError::UnknownProducer(_)
                | GovernanceError::VoterNotFound(_)
                | GovernanceError::UnknownDbp(_)
                | GovernanceError::NotPunished(_)
        )
    }
}

/// Result type for Governance operations
pub type Result<T> = std::result::Result<T, GovernanceError>;
