//! Host collaborators
//!
//! Everything the system core needs from its host beyond the token ledger:
//! proof verification, schedule publication, the chain head, and the
//! resource-weight oracle used for DBP shares. Each trait has an in-memory
//! implementation with shared interior state, so a test can keep a clone and
//! observe or steer the collaborator after handing it to the contract.

use celes_governance::{ProofVerifier, ScheduleEntry};
use celes_types::{BlockNum, Name, TimePoint, MICROS_PER_SLOT};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use thiserror::Error;

/// Failure reported by a host collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{reason}")]
pub struct HostError {
    pub reason: String,
}

impl HostError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Proof-of-work check plus the difficulty it should enforce.
pub trait WoodVerifier: ProofVerifier + Send + Sync {
    fn set_difficulty(&mut self, difficulty: f64);
}

/// Installs a new producer schedule.
pub trait SchedulePublisher: Send + Sync {
    fn publish_schedule(&mut self, slate: &[ScheduleEntry]) -> Result<(), HostError>;
}

/// Read access to the chain the core runs on.
pub trait ChainHead: Send + Sync {
    fn head_block_num(&self) -> BlockNum;
    fn current_time(&self) -> TimePoint;
}

/// Resource-usage weights that DBP rewards are shared by.
pub trait ResourceWeightOracle: Send + Sync {
    fn total_unpaid_weight(&self) -> u64;
    fn unpaid_weight(&self, owner: &Name) -> u64;
    fn mark_claimed(&mut self, owner: &Name);
    fn register(&mut self, owner: &Name);
    fn unregister(&mut self, owner: &Name);
}

#[derive(Debug, Default)]
struct VerifierState {
    rejected: BTreeSet<String>,
    difficulties: Vec<f64>,
}

/// Accepts every proof except explicitly rejected ones; records difficulty updates.
#[derive(Debug, Clone, Default)]
pub struct MemoryVerifier {
    inner: Arc<Mutex<VerifierState>>,
}

impl MemoryVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject(&self, wood: impl Into<String>) {
        self.inner.lock().rejected.insert(wood.into());
    }

    pub fn difficulties(&self) -> Vec<f64> {
        self.inner.lock().difficulties.clone()
    }

    pub fn current_difficulty(&self) -> Option<f64> {
        self.inner.lock().difficulties.last().copied()
    }
}

impl ProofVerifier for MemoryVerifier {
    fn verify(&self, _block_number: BlockNum, _owner: &Name, wood: &str) -> bool {
        !self.inner.lock().rejected.contains(wood)
    }
}

impl WoodVerifier for MemoryVerifier {
    fn set_difficulty(&mut self, difficulty: f64) {
        self.inner.lock().difficulties.push(difficulty);
    }
}

#[derive(Debug, Default)]
struct PublisherState {
    published: Vec<Vec<ScheduleEntry>>,
    failing: bool,
}

/// Keeps every published slate; can be told to fail.
#[derive(Debug, Clone, Default)]
pub struct MemoryPublisher {
    inner: Arc<Mutex<PublisherState>>,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.inner.lock().failing = failing;
    }

    pub fn published(&self) -> Vec<Vec<ScheduleEntry>> {
        self.inner.lock().published.clone()
    }

    pub fn last_published(&self) -> Option<Vec<ScheduleEntry>> {
        self.inner.lock().published.last().cloned()
    }
}

impl SchedulePublisher for MemoryPublisher {
    fn publish_schedule(&mut self, slate: &[ScheduleEntry]) -> Result<(), HostError> {
        let mut inner = self.inner.lock();
        if inner.failing {
            return Err(HostError::new("schedule rejected by host"));
        }
        inner.published.push(slate.to_vec());
        Ok(())
    }
}

/// Manually driven chain head: one slot per block.
#[derive(Debug, Clone, Default)]
pub struct ManualChain {
    inner: Arc<Mutex<(BlockNum, TimePoint)>>,
}

impl ManualChain {
    pub fn new(head: BlockNum, time: TimePoint) -> Self {
        Self {
            inner: Arc::new(Mutex::new((head, time))),
        }
    }

    pub fn set(&self, head: BlockNum, time: TimePoint) {
        *self.inner.lock() = (head, time);
    }

    /// Move the head forward by `blocks`, advancing time by one slot each.
    pub fn advance(&self, blocks: BlockNum) {
        let mut inner = self.inner.lock();
        inner.0 = inner.0.saturating_add(blocks);
        inner.1 = inner.1 + blocks as u64 * MICROS_PER_SLOT;
    }

    /// Move time forward without producing blocks.
    pub fn advance_time(&self, micros: u64) {
        let mut inner = self.inner.lock();
        inner.1 = inner.1 + micros;
    }
}

impl ChainHead for ManualChain {
    fn head_block_num(&self) -> BlockNum {
        self.inner.lock().0
    }

    fn current_time(&self) -> TimePoint {
        self.inner.lock().1
    }
}

#[derive(Debug, Default)]
struct OracleState {
    registered: BTreeSet<Name>,
    weights: BTreeMap<Name, u64>,
}

/// Weights set by hand; only registered owners count towards the total.
#[derive(Debug, Clone, Default)]
pub struct MemoryWeightOracle {
    inner: Arc<Mutex<OracleState>>,
}

impl MemoryWeightOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_weight(&self, owner: Name, weight: u64) {
        self.inner.lock().weights.insert(owner, weight);
    }

    pub fn is_registered(&self, owner: &Name) -> bool {
        self.inner.lock().registered.contains(owner)
    }
}

impl ResourceWeightOracle for MemoryWeightOracle {
    fn total_unpaid_weight(&self) -> u64 {
        let inner = self.inner.lock();
        inner
            .registered
            .iter()
            .filter_map(|owner| inner.weights.get(owner))
            .fold(0u64, |acc, w| acc.saturating_add(*w))
    }

    fn unpaid_weight(&self, owner: &Name) -> u64 {
        let inner = self.inner.lock();
        if !inner.registered.contains(owner) {
            return 0;
        }
        inner.weights.get(owner).copied().unwrap_or(0)
    }

    fn mark_claimed(&mut self, owner: &Name) {
        self.inner.lock().weights.remove(owner);
    }

    fn register(&mut self, owner: &Name) {
        self.inner.lock().registered.insert(*owner);
    }

    fn unregister(&mut self, owner: &Name) {
        let mut inner = self.inner.lock();
        inner.registered.remove(owner);
        inner.weights.remove(owner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> Name {
        Name::new(s).unwrap()
    }

    #[test]
    fn test_manual_chain_advances_by_slot() {
        let chain = ManualChain::new(10, TimePoint::from_secs(100));
        chain.advance(4);
        assert_eq!(chain.head_block_num(), 14);
        assert_eq!(chain.current_time(), TimePoint::from_secs(102));
    }

    #[test]
    fn test_publisher_failure_records_nothing() {
        let mut publisher = MemoryPublisher::new();
        publisher.set_failing(true);
        assert!(publisher.publish_schedule(&[]).is_err());
        assert!(publisher.published().is_empty());

        publisher.set_failing(false);
        publisher.publish_schedule(&[]).unwrap();
        assert_eq!(publisher.published().len(), 1);
    }

    #[test]
    fn test_oracle_counts_registered_owners_only() {
        let mut oracle = MemoryWeightOracle::new();
        oracle.set_weight(name("dappa"), 3);
        oracle.set_weight(name("dappb"), 1);
        oracle.register(&name("dappa"));
        assert_eq!(oracle.total_unpaid_weight(), 3);
        assert_eq!(oracle.unpaid_weight(&name("dappb")), 0);

        oracle.mark_claimed(&name("dappa"));
        assert_eq!(oracle.unpaid_weight(&name("dappa")), 0);
    }

    #[test]
    fn test_verifier_rejects_listed_proofs() {
        let mut verifier = MemoryVerifier::new();
        verifier.reject("bad");
        assert!(!verifier.verify(1, &name("alice"), "bad"));
        assert!(verifier.verify(1, &name("alice"), "good"));
        verifier.set_difficulty(0.5);
        assert_eq!(verifier.current_difficulty(), Some(0.5));
    }
}
