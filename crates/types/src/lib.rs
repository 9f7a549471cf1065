//! Shared primitive types for the Celes system core.
//!
//! Account names, token assets, producer keys, chain time, and the global
//! state record used by the exchange, governance, and reward crates.

pub mod asset;
pub mod global_state;
pub mod key;
pub mod name;
pub mod time;

pub use asset::*;
pub use global_state::*;
pub use key::*;
pub use name::*;
pub use time::*;
