//! Celes Economics
//!
//! Implements the resource-economics half of the system core:
//! - Constant-product (50/50 Bancor relay) resource exchange
//! - Per-block halving emission for the three reward pools
//! - Claim settlement with minimum payout and punish-scaled cool-down

pub mod distribution;
pub mod emission;
pub mod errors;
pub mod exchange;
pub mod types;

pub use distribution::*;
pub use emission::*;
pub use errors::*;
pub use exchange::*;
pub use types::*;

/// Module version for API introspection
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
