//! Effect journal
//!
//! A transition never calls a mutating collaborator directly. It records
//! what should happen here, and the journal is committed only after the
//! transition itself succeeded.

use crate::errors::{Result, SystemError};
use crate::host::{ResourceWeightOracle, SchedulePublisher, WoodVerifier};
use celes_governance::ScheduleEntry;
use celes_treasury::{TokenLedger, Transfer};
use celes_types::{Name, Symbol};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Deferred call into the resource-weight oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OracleOp {
    Register(Name),
    Unregister(Name),
    MarkClaimed(Name),
}

/// Mutating collaborator calls gathered during one transition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Effects {
    pub transfers: Vec<Transfer>,
    pub schedule: Option<Vec<ScheduleEntry>>,
    pub difficulty: Option<f64>,
    pub oracle: Vec<OracleOp>,
}

impl Effects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
            && self.schedule.is_none()
            && self.difficulty.is_none()
            && self.oracle.is_empty()
    }

    pub fn transfer(&mut self, transfer: Transfer) {
        debug!(
            target: "system",
            "journal transfer {} -> {}: {} ({})",
            transfer.from, transfer.to, transfer.quantity, transfer.memo
        );
        self.transfers.push(transfer);
    }

    /// Net change the journalled transfers make to `account`'s balance.
    pub fn net_delta(&self, account: &Name, symbol: Symbol) -> i64 {
        self.transfers
            .iter()
            .filter(|t| t.quantity.symbol == symbol)
            .fold(0i64, |acc, t| {
                let mut acc = acc;
                if t.to == *account {
                    acc = acc.saturating_add(t.quantity.amount);
                }
                if t.from == *account {
                    acc = acc.saturating_sub(t.quantity.amount);
                }
                acc
            })
    }

    /// Apply the journal to the collaborators.
    ///
    /// Transfers go first as one batch. If publishing the schedule then
    /// fails, the batch is reverted and the error returned. Difficulty and
    /// oracle updates cannot fail and come last.
    pub fn commit(
        self,
        ledger: &mut dyn TokenLedger,
        publisher: &mut dyn SchedulePublisher,
        verifier: &mut dyn WoodVerifier,
        oracle: &mut dyn ResourceWeightOracle,
    ) -> Result<()> {
        ledger.transfer_all(&self.transfers)?;

        if let Some(slate) = &self.schedule {
            if let Err(err) = publisher.publish_schedule(slate) {
                let reverts: Vec<Transfer> =
                    self.transfers.iter().rev().map(Transfer::reversed).collect();
                if let Err(revert_err) = ledger.transfer_all(&reverts) {
                    warn!(
                        target: "system",
                        "failed to revert {} transfers after schedule rejection: {}",
                        reverts.len(), revert_err
                    );
                }
                return Err(SystemError::Publish(err));
            }
            info!(
                target: "election",
                "published producer schedule of {} producers",
                slate.len()
            );
        }

        if let Some(difficulty) = self.difficulty {
            verifier.set_difficulty(difficulty);
        }

        for op in &self.oracle {
            match op {
                OracleOp::Register(owner) => oracle.register(owner),
                OracleOp::Unregister(owner) => oracle.unregister(owner),
                OracleOp::MarkClaimed(owner) => oracle.mark_claimed(owner),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{MemoryPublisher, MemoryVerifier, MemoryWeightOracle};
    use celes_treasury::MockTokenLedger;
    use celes_types::Asset;

    fn name(s: &str) -> Name {
        Name::new(s).unwrap()
    }

    fn core(amount: i64) -> Asset {
        Asset::new(amount, Symbol::new("CELES", 4).unwrap())
    }

    #[test]
    fn test_net_delta_follows_journal() {
        let mut effects = Effects::new();
        effects.transfer(Transfer::new(name("alice"), name("bob"), core(30), "a"));
        effects.transfer(Transfer::new(name("bob"), name("carol"), core(10), "b"));
        assert_eq!(effects.net_delta(&name("alice"), core(0).symbol), -30);
        assert_eq!(effects.net_delta(&name("bob"), core(0).symbol), 20);
        assert_eq!(effects.net_delta(&name("dave"), core(0).symbol), 0);
    }

    #[test]
    fn test_rejected_schedule_reverts_transfers() {
        let mut ledger = MockTokenLedger::new();
        ledger.issue(name("alice"), core(100)).unwrap();
        let mut publisher = MemoryPublisher::new();
        publisher.set_failing(true);
        let mut verifier = MemoryVerifier::new();
        let mut oracle = MemoryWeightOracle::new();

        let mut effects = Effects::new();
        effects.transfer(Transfer::new(name("alice"), name("bob"), core(40), "pay"));
        effects.schedule = Some(Vec::new());
        effects.difficulty = Some(2.0);

        let err = effects
            .commit(&mut ledger, &mut publisher, &mut verifier, &mut oracle)
            .unwrap_err();
        assert!(matches!(err, SystemError::Publish(_)));
        assert_eq!(
            ledger.get_balance(&name("alice"), core(0).symbol).unwrap(),
            core(100)
        );
        assert_eq!(
            ledger.get_balance(&name("bob"), core(0).symbol).unwrap(),
            core(0)
        );
        assert!(verifier.difficulties().is_empty());
    }

    #[test]
    fn test_commit_applies_everything() {
        let mut ledger = MockTokenLedger::new();
        ledger.issue(name("alice"), core(100)).unwrap();
        let mut publisher = MemoryPublisher::new();
        let mut verifier = MemoryVerifier::new();
        let mut oracle = MemoryWeightOracle::new();

        let mut effects = Effects::new();
        effects.transfer(Transfer::new(name("alice"), name("bob"), core(40), "pay"));
        effects.schedule = Some(Vec::new());
        effects.difficulty = Some(2.0);
        effects.oracle.push(OracleOp::Register(name("dappa")));

        effects
            .commit(&mut ledger, &mut publisher, &mut verifier, &mut oracle)
            .unwrap();
        assert_eq!(ledger.get_transfer_calls().len(), 1);
        assert_eq!(publisher.published().len(), 1);
        assert_eq!(verifier.current_difficulty(), Some(2.0));
        assert!(oracle.is_registered(&name("dappa")));
    }
}
