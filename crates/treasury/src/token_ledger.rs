//! Token ledger interface used for every pool movement and payout
//!
//! The system core never holds balances itself: pool holdings, accrual
//! accounts and user funds live in an external fungible-token ledger reached
//! through [`TokenLedger`].

use crate::errors::{LedgerError, Result};
use celes_types::{Asset, Name, Symbol};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

pub const MAX_MEMO_BYTES: usize = 256;

/// One token movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: Name,
    pub to: Name,
    pub quantity: Asset,
    pub memo: String,
}

impl Transfer {
    pub fn new(from: Name, to: Name, quantity: Asset, memo: impl Into<String>) -> Self {
        Self {
            from,
            to,
            quantity,
            memo: memo.into(),
        }
    }

    /// The transfer that undoes this one.
    pub fn reversed(&self) -> Transfer {
        Transfer {
            from: self.to,
            to: self.from,
            quantity: self.quantity,
            memo: format!("revert: {}", self.memo),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.from == self.to {
            return Err(LedgerError::SelfTransfer(self.from));
        }
        if self.quantity.amount <= 0 || !self.quantity.is_amount_within_range() {
            return Err(LedgerError::NonPositiveQuantity(self.quantity));
        }
        if self.memo.len() > MAX_MEMO_BYTES {
            return Err(LedgerError::MemoTooLong);
        }
        Ok(())
    }
}

/// Interface for the external token ledger.
pub trait TokenLedger: Send + Sync {
    /// Move tokens. Either fully applies or fails without effect.
    fn transfer(&mut self, transfer: &Transfer) -> Result<()>;

    /// Balance of `account` in `symbol`, zero if it never held any.
    fn get_balance(&self, account: &Name, symbol: Symbol) -> Result<Asset>;

    /// Apply a batch in order. If any transfer fails, the ones already
    /// applied are reverted in reverse order and the first error is returned.
    fn transfer_all(&mut self, batch: &[Transfer]) -> Result<()> {
        for (applied, transfer) in batch.iter().enumerate() {
            if let Err(err) = self.transfer(transfer) {
                warn!(
                    target: "treasury",
                    "transfer {} of {} failed ({}), reverting {} applied",
                    applied + 1,
                    batch.len(),
                    err,
                    applied
                );
                for done in batch[..applied].iter().rev() {
                    if let Err(revert_err) = self.transfer(&done.reversed()) {
                        warn!(target: "treasury", "revert of {:?} failed: {}", done, revert_err);
                    }
                }
                return Err(err);
            }
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// In-memory implementation (for node runtime or testing)
// -----------------------------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InMemoryTokenLedger {
    balances: BTreeMap<Name, BTreeMap<Symbol, i64>>,
}

impl InMemoryTokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint `quantity` into `account`, used to fund genesis accounts.
    pub fn issue(&mut self, account: Name, quantity: Asset) -> Result<()> {
        if quantity.amount <= 0 {
            return Err(LedgerError::NonPositiveQuantity(quantity));
        }
        let balance = self.balance_mut(account, quantity.symbol);
        let updated = Asset::new(*balance, quantity.symbol).checked_add(quantity)?;
        *balance = updated.amount;
        Ok(())
    }

    /// Every non-zero balance, for inspection.
    pub fn balances(&self) -> impl Iterator<Item = (Name, Asset)> + '_ {
        self.balances.iter().flat_map(|(account, by_symbol)| {
            by_symbol
                .iter()
                .filter(|(_, amount)| **amount != 0)
                .map(move |(symbol, amount)| (*account, Asset::new(*amount, *symbol)))
        })
    }

    fn balance(&self, account: &Name, symbol: Symbol) -> i64 {
        self.balances
            .get(account)
            .and_then(|by_symbol| by_symbol.get(&symbol))
            .copied()
            .unwrap_or(0)
    }

    fn balance_mut(&mut self, account: Name, symbol: Symbol) -> &mut i64 {
        self.balances
            .entry(account)
            .or_default()
            .entry(symbol)
            .or_insert(0)
    }
}

impl TokenLedger for InMemoryTokenLedger {
    fn transfer(&mut self, transfer: &Transfer) -> Result<()> {
        transfer.validate()?;
        let symbol = transfer.quantity.symbol;
        let available = Asset::new(self.balance(&transfer.from, symbol), symbol);
        if available.amount < transfer.quantity.amount {
            return Err(LedgerError::InsufficientBalance {
                account: transfer.from,
                available,
                needed: transfer.quantity,
            });
        }
        let credited =
            Asset::new(self.balance(&transfer.to, symbol), symbol).checked_add(transfer.quantity)?;

        *self.balance_mut(transfer.from, symbol) = available.amount - transfer.quantity.amount;
        *self.balance_mut(transfer.to, symbol) = credited.amount;
        debug!(
            target: "treasury",
            "{} -> {}: {} ({})",
            transfer.from, transfer.to, transfer.quantity, transfer.memo
        );
        Ok(())
    }

    fn get_balance(&self, account: &Name, symbol: Symbol) -> Result<Asset> {
        Ok(Asset::new(self.balance(account, symbol), symbol))
    }
}

/// A ledger shared between the transition engine and an observer.
impl<L: TokenLedger> TokenLedger for Arc<Mutex<L>> {
    fn transfer(&mut self, transfer: &Transfer) -> Result<()> {
        self.lock().transfer(transfer)
    }

    fn get_balance(&self, account: &Name, symbol: Symbol) -> Result<Asset> {
        self.lock().get_balance(account, symbol)
    }
}

// -----------------------------------------------------------------------------
// Mock ledger (for deterministic testing and failure injection)
// -----------------------------------------------------------------------------
#[derive(Debug, Clone, Default)]
pub struct MockTokenLedger {
    inner: InMemoryTokenLedger,
    transfer_calls: Vec<Transfer>,
    failing_recipients: Vec<Name>,
    fail_after: Option<usize>,
}

impl MockTokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, account: Name, quantity: Asset) -> Result<()> {
        self.inner.issue(account, quantity)
    }

    /// Every attempted transfer, including rejected and compensating ones.
    pub fn get_transfer_calls(&self) -> &[Transfer] {
        &self.transfer_calls
    }

    pub fn clear_calls(&mut self) {
        self.transfer_calls.clear();
    }

    /// Reject every transfer paying `account`.
    pub fn fail_transfers_to(&mut self, account: Name) {
        self.failing_recipients.push(account);
    }

    /// Reject every transfer once `count` transfers have been accepted.
    pub fn fail_after(&mut self, count: usize) {
        self.fail_after = Some(count);
    }

    pub fn heal(&mut self) {
        self.failing_recipients.clear();
        self.fail_after = None;
    }

    fn accepted(&self) -> usize {
        self.transfer_calls.len()
    }
}

impl TokenLedger for MockTokenLedger {
    fn transfer(&mut self, transfer: &Transfer) -> Result<()> {
        let exhausted = self.fail_after.is_some_and(|limit| self.accepted() >= limit);
        self.transfer_calls.push(transfer.clone());
        if exhausted || self.failing_recipients.contains(&transfer.to) {
            // rejected calls do not count towards fail_after
            self.transfer_calls.pop();
            return Err(LedgerError::Rejected(format!(
                "injected failure paying {}",
                transfer.to
            )));
        }
        self.inner.transfer(transfer).inspect_err(|_| {
            self.transfer_calls.pop();
        })
    }

    fn get_balance(&self, account: &Name, symbol: Symbol) -> Result<Asset> {
        self.inner.get_balance(account, symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> Name {
        Name::new(s).unwrap()
    }

    fn core(amount: i64) -> Asset {
        Asset::new(amount, Symbol::new("CELES", 4).unwrap())
    }

    #[test]
    fn test_in_memory_ledger_operations() {
        let mut ledger = InMemoryTokenLedger::new();
        ledger.issue(name("alice"), core(1000)).unwrap();
        ledger
            .transfer(&Transfer::new(name("alice"), name("bob"), core(300), "pay"))
            .unwrap();

        let symbol = core(0).symbol;
        assert_eq!(ledger.get_balance(&name("alice"), symbol).unwrap(), core(700));
        assert_eq!(ledger.get_balance(&name("bob"), symbol).unwrap(), core(300));
        assert_eq!(ledger.get_balance(&name("carol"), symbol).unwrap(), core(0));
    }

    #[test]
    fn test_insufficient_balance() {
        let mut ledger = InMemoryTokenLedger::new();
        ledger.issue(name("alice"), core(10)).unwrap();
        let err = ledger
            .transfer(&Transfer::new(name("alice"), name("bob"), core(11), ""))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
        assert_eq!(ledger.get_balance(&name("alice"), core(0).symbol).unwrap(), core(10));
    }

    #[test]
    fn test_transfer_validation() {
        let mut ledger = InMemoryTokenLedger::new();
        ledger.issue(name("alice"), core(10)).unwrap();
        assert_eq!(
            ledger.transfer(&Transfer::new(name("alice"), name("alice"), core(1), "")),
            Err(LedgerError::SelfTransfer(name("alice")))
        );
        assert!(matches!(
            ledger.transfer(&Transfer::new(name("alice"), name("bob"), core(0), "")),
            Err(LedgerError::NonPositiveQuantity(_))
        ));
        assert_eq!(
            ledger.transfer(&Transfer::new(name("alice"), name("bob"), core(1), "m".repeat(257))),
            Err(LedgerError::MemoTooLong)
        );
    }

    #[test]
    fn test_batch_compensates_on_failure() {
        let mut ledger = MockTokenLedger::new();
        ledger.issue(name("pool"), core(100)).unwrap();
        ledger.fail_transfers_to(name("carol"));

        let batch = vec![
            Transfer::new(name("pool"), name("alice"), core(10), "a"),
            Transfer::new(name("pool"), name("bob"), core(20), "b"),
            Transfer::new(name("pool"), name("carol"), core(30), "c"),
        ];
        assert!(ledger.transfer_all(&batch).is_err());

        let symbol = core(0).symbol;
        assert_eq!(ledger.get_balance(&name("pool"), symbol).unwrap(), core(100));
        assert_eq!(ledger.get_balance(&name("alice"), symbol).unwrap(), core(0));
        assert_eq!(ledger.get_balance(&name("bob"), symbol).unwrap(), core(0));
        // two forward transfers and two reversals
        assert_eq!(ledger.get_transfer_calls().len(), 4);
        assert_eq!(ledger.get_transfer_calls()[2].from, name("bob"));
    }

    #[test]
    fn test_fail_after() {
        let mut ledger = MockTokenLedger::new();
        ledger.issue(name("pool"), core(100)).unwrap();
        ledger.fail_after(1);
        let t = Transfer::new(name("pool"), name("alice"), core(1), "");
        ledger.transfer(&t).unwrap();
        assert!(ledger.transfer(&t).is_err());
        ledger.heal();
        ledger.transfer(&t).unwrap();
    }
}
