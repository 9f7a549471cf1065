//! Celes Governance Module
//!
//! Producer-side state of the system core:
//! - producer registry ranked by live vote weight, and the periodic election
//! - voter/proxy records used to delegate wood submission
//! - the wood (proof) ledger with per-producer and per-period aggregates
//! - the windowed difficulty controller
//! - bounded-batch compaction of expired history
//! - punishment counters and the DBP registry
//!
//! Everything here is a pure transformation of in-memory tables; external
//! collaborators (proof verification, schedule publication) are reached
//! through traits or returned as data for the caller to commit.

pub mod compactor;
pub mod dbp;
pub mod difficulty;
pub mod election;
pub mod errors;
pub mod parameters;
pub mod producers;
pub mod punish;
pub mod state;
pub mod types;
pub mod voters;
pub mod voting;
pub mod wood;

pub use compactor::*;
pub use dbp::*;
pub use difficulty::*;
pub use election::*;
pub use errors::*;
pub use parameters::*;
pub use producers::*;
pub use punish::*;
pub use state::*;
pub use types::*;
pub use voters::*;
pub use voting::*;
pub use wood::*;

/// Governance module version (for API introspection)
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
