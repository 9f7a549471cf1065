//! The system core wired to in-process collaborators and a snapshot store.

use crate::config::NodeConfig;
use crate::script::ScriptStep;
use anyhow::{bail, Context, Result};
use celes_economics::RewardPoolKind;
use celes_governance::ScheduleEntry;
use celes_storage::{load_latest, prune_snapshots, save_state, PruneReport, RetentionPolicy, StateStore};
use celes_system::{
    Action, ActionOutcome, BlockReport, ChainHead, Host, ManualChain, MemoryPublisher, MemoryVerifier,
    MemoryWeightOracle, ResourceWeightOracle, SchedulePublisher, SystemContract, SystemError,
    SystemState, WoodVerifier,
};
use celes_treasury::InMemoryTokenLedger;
use celes_types::{Asset, BlockNum, TimePoint, MICROS_PER_SECOND};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Everything needed to resume: the core state plus what the in-process
/// collaborators hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub state: SystemState,
    pub ledger: InMemoryTokenLedger,
    pub head_block: BlockNum,
    pub time: TimePoint,
    pub difficulty: Option<f64>,
    pub schedule: Option<Vec<ScheduleEntry>>,
}

/// Result of one script step.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum StepOutcome {
    Action(ActionOutcome),
    Blocks(Vec<BlockReport>),
    Clock { time: TimePoint },
}

pub struct NodeRuntime {
    contract: SystemContract,
    ledger: Arc<Mutex<InMemoryTokenLedger>>,
    chain: ManualChain,
    verifier: MemoryVerifier,
    publisher: MemoryPublisher,
    store: Box<dyn StateStore>,
    retention: RetentionPolicy,
}

impl NodeRuntime {
    /// Fund the genesis accounts, create the resource market, and store the
    /// first snapshot. Fails if the store already holds one.
    pub fn genesis(config: &NodeConfig, store: Box<dyn StateStore>) -> Result<Self> {
        if store.latest_snapshot()?.is_some() {
            bail!("state store is already initialised");
        }
        let genesis = &config.genesis;
        let symbol = genesis.core_symbol;

        let mut ledger = InMemoryTokenLedger::new();
        if genesis.fund_reward_pools {
            for pool in RewardPoolKind::ALL {
                let capacity = i64::try_from(config.system.economics.pool_capacity(pool))
                    .context("pool capacity exceeds the token range")?;
                ledger
                    .issue(config.system.accounts.pool_account(pool), Asset::new(capacity, symbol))
                    .with_context(|| format!("failed to fund the {}", pool))?;
            }
        }
        for balance in &genesis.balances {
            ledger
                .issue(balance.account, balance.quantity)
                .with_context(|| format!("failed to fund {}", balance.account))?;
        }

        let chain = ManualChain::new(
            genesis.start_block,
            TimePoint::from_secs(genesis.start_time_secs),
        );
        let parts = Collaborators::new(ledger, chain);
        let contract = SystemContract::new(config.system.clone(), parts.host())?;
        let mut runtime = parts.into_runtime(contract, store, config);

        let system = config.system.accounts.system;
        runtime.contract.apply(
            system,
            Action::Init {
                core_symbol: symbol,
                quote_balance: genesis.quote_balance,
            },
        )?;
        let sequence = runtime.persist()?;
        info!(
            target: "node",
            "genesis at block {} stored as snapshot {}",
            genesis.start_block, sequence
        );
        Ok(runtime)
    }

    /// Resume from the latest snapshot.
    pub fn open(config: &NodeConfig, store: Box<dyn StateStore>) -> Result<Self> {
        let Some((meta, snapshot)) = load_latest::<_, NodeSnapshot>(store.as_ref())? else {
            bail!("no stored state; run `celes-node init` first");
        };
        debug!(
            target: "node",
            "resuming snapshot {} at block {}",
            meta.sequence, meta.head_block
        );

        let chain = ManualChain::new(snapshot.head_block, snapshot.time);
        let mut parts = Collaborators::new(snapshot.ledger, chain);
        if let Some(difficulty) = snapshot.difficulty {
            parts.verifier.set_difficulty(difficulty);
        }
        if let Some(slate) = &snapshot.schedule {
            parts
                .publisher
                .publish_schedule(slate)
                .context("failed to restore the producer schedule")?;
        }
        for owner in snapshot.state.governance.dbps.owners() {
            parts.oracle.register(&owner);
        }

        let contract =
            SystemContract::from_state(snapshot.state, config.system.clone(), parts.host())?;
        Ok(parts.into_runtime(contract, store, config))
    }

    pub fn state(&self) -> &SystemState {
        self.contract.state()
    }

    pub fn head_block(&self) -> BlockNum {
        self.contract.head_block_num()
    }

    pub fn balances(&self) -> Vec<(celes_types::Name, Asset)> {
        self.ledger.lock().balances().collect()
    }

    pub fn difficulty(&self) -> Option<f64> {
        self.verifier.current_difficulty()
    }

    pub fn schedule(&self) -> Option<Vec<ScheduleEntry>> {
        self.publisher.last_published()
    }

    /// Run one step. A rejected step leaves the runtime unchanged, except
    /// that blocks produced before a failing block stay applied.
    pub fn run_step(&mut self, step: &ScriptStep) -> std::result::Result<StepOutcome, SystemError> {
        match step {
            ScriptStep::Apply { signer, action } => self
                .contract
                .apply(*signer, action.clone())
                .map(StepOutcome::Action),
            ScriptStep::Blocks { producer, count } => {
                let mut reports = Vec::with_capacity(*count as usize);
                for _ in 0..*count {
                    let (head, time) = (self.chain.head_block_num(), self.chain.current_time());
                    self.chain.advance(1);
                    match self.contract.on_block(*producer) {
                        Ok(report) => reports.push(report),
                        Err(err) => {
                            self.chain.set(head, time);
                            return Err(err);
                        }
                    }
                }
                Ok(StepOutcome::Blocks(reports))
            }
            ScriptStep::AdvanceTime { secs } => {
                self.chain.advance_time(secs.saturating_mul(MICROS_PER_SECOND));
                Ok(StepOutcome::Clock {
                    time: self.chain.current_time(),
                })
            }
        }
    }

    pub fn snapshot(&self) -> NodeSnapshot {
        NodeSnapshot {
            state: self.contract.state().clone(),
            ledger: self.ledger.lock().clone(),
            head_block: self.head_block(),
            time: self.chain.current_time(),
            difficulty: self.difficulty(),
            schedule: self.schedule(),
        }
    }

    /// Store a snapshot and prune the ones the retention policy drops.
    pub fn persist(&self) -> Result<u64> {
        let snapshot = self.snapshot();
        let sequence = save_state(self.store.as_ref(), snapshot.head_block, &snapshot)?;
        let report = prune_snapshots(self.store.as_ref(), &self.retention)?;
        self.store.flush()?;
        debug!(
            target: "node",
            "snapshot {} stored, {} pruned",
            sequence, report.pruned_entries
        );
        Ok(sequence)
    }
}

/// Apply `policy` to a store without loading any state.
pub fn compact_store(store: &dyn StateStore, policy: &RetentionPolicy) -> Result<PruneReport> {
    let report = prune_snapshots(store, policy)?;
    store.flush()?;
    Ok(report)
}

struct Collaborators {
    ledger: Arc<Mutex<InMemoryTokenLedger>>,
    chain: ManualChain,
    verifier: MemoryVerifier,
    publisher: MemoryPublisher,
    oracle: MemoryWeightOracle,
}

impl Collaborators {
    fn new(ledger: InMemoryTokenLedger, chain: ManualChain) -> Self {
        Self {
            ledger: Arc::new(Mutex::new(ledger)),
            chain,
            verifier: MemoryVerifier::new(),
            publisher: MemoryPublisher::new(),
            oracle: MemoryWeightOracle::new(),
        }
    }

    fn host(&self) -> Host {
        Host::new(
            self.ledger.clone(),
            self.verifier.clone(),
            self.publisher.clone(),
            self.chain.clone(),
            self.oracle.clone(),
        )
    }

    fn into_runtime(
        self,
        contract: SystemContract,
        store: Box<dyn StateStore>,
        config: &NodeConfig,
    ) -> NodeRuntime {
        NodeRuntime {
            contract,
            ledger: self.ledger,
            chain: self.chain,
            verifier: self.verifier,
            publisher: self.publisher,
            store,
            retention: RetentionPolicy::keep_latest(config.retain_snapshots),
        }
    }
}
