//! Celes System
//!
//! The transition engine of the system core. Each action or block tick
//! runs against a working copy of the state and an effect journal; the
//! journal is committed to the host collaborators only when the whole
//! transition succeeded.

pub mod action;
pub mod auction;
pub mod block;
pub mod config;
pub mod contract;
pub mod effects;
pub mod errors;
pub mod handle;
pub mod host;
mod registry;
pub mod resources;
pub mod rewards;
mod staking;
pub mod state;

pub use action::{Action, ActionOutcome};
pub use auction::{BidStatus, NameBid, NameBidTable};
pub use block::BlockReport;
pub use config::{ResourceParams, SystemConfig};
pub use contract::{Host, SystemContract};
pub use effects::{Effects, OracleOp};
pub use errors::{ErrorKind, Result, SystemError};
pub use handle::SystemHandle;
pub use host::{
    ChainHead, HostError, ManualChain, MemoryPublisher, MemoryVerifier, MemoryWeightOracle,
    ResourceWeightOracle, SchedulePublisher, WoodVerifier,
};
pub use resources::ResourceTrade;
pub use rewards::ClaimReceipt;
pub use state::SystemState;

/// Module version for API introspection
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
