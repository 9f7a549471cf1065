//! Celes Treasury Module
//!
//! Token movements of the system core: the external ledger interface,
//! the accounts backing each reward pool, and deferred transfers.

pub mod errors;
pub mod outbox;
pub mod reward_pool;
pub mod token_ledger;

pub use errors::{LedgerError, Result};
pub use outbox::{Outbox, ScheduledTransfer};
pub use reward_pool::SystemAccounts;
pub use token_ledger::{InMemoryTokenLedger, MockTokenLedger, TokenLedger, Transfer, MAX_MEMO_BYTES};
