#![allow(dead_code)]

use celes_economics::EconomicsParams;
use celes_governance::{GovernanceParams, VoteRequest};
use celes_system::{
    Action, ActionOutcome, BlockReport, Host, ManualChain, MemoryPublisher, MemoryVerifier,
    MemoryWeightOracle, Result, SystemConfig, SystemContract,
};
use celes_treasury::{MockTokenLedger, TokenLedger};
use celes_types::{Asset, Name, PublicKey, Symbol, TimePoint, MICROS_PER_SECOND};
use parking_lot::Mutex;
use std::sync::Arc;

pub const START_SECS: u64 = 1_000;
pub const COOLDOWN_SECS: u64 = 60;
pub const ORIGIN_REWARD: u64 = 1_000_000;

pub fn name(s: &str) -> Name {
    Name::new(s).unwrap()
}

pub fn core_symbol() -> Symbol {
    Symbol::new("CELES", 4).unwrap()
}

pub fn core(amount: i64) -> Asset {
    Asset::new(amount, core_symbol())
}

pub fn key(byte: u8) -> PublicKey {
    PublicKey::from_bytes([byte; 33])
}

/// Short intervals: 3 producers, activation after 2 elections, an election
/// every 10 blocks, DBP activation 50 blocks after the network.
pub fn test_config() -> SystemConfig {
    SystemConfig {
        governance: GovernanceParams {
            bp_count: 3,
            active_network_cycle: 2,
            singing_ticker_sep: 10,
            difficulty_period: 5,
            retention_period: 100,
            dbp_active_sep: 50,
            ..Default::default()
        },
        economics: EconomicsParams {
            origin_reward_block_pay: ORIGIN_REWARD,
            origin_reward_wood_pay: ORIGIN_REWARD,
            origin_reward_dapp_pay: ORIGIN_REWARD,
            reward_time_sep_micros: COOLDOWN_SECS * MICROS_PER_SECOND,
            ..Default::default()
        },
        ..Default::default()
    }
}

pub struct Harness {
    pub contract: SystemContract,
    pub ledger: Arc<Mutex<MockTokenLedger>>,
    pub chain: ManualChain,
    pub publisher: MemoryPublisher,
    pub verifier: MemoryVerifier,
    pub oracle: MemoryWeightOracle,
    wood_counter: u64,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    /// Pools funded at capacity, alice and bob with 1000 tokens each.
    pub fn with_config(config: SystemConfig) -> Self {
        let mut ledger = MockTokenLedger::new();
        let accounts = &config.accounts;
        let economics = &config.economics;
        ledger
            .issue(accounts.block_pay_pool, core(economics.block_pay_pool_capacity as i64))
            .unwrap();
        ledger
            .issue(accounts.wood_pay_pool, core(economics.wood_pay_pool_capacity as i64))
            .unwrap();
        ledger
            .issue(accounts.dapp_pay_pool, core(economics.dapp_pay_pool_capacity as i64))
            .unwrap();
        ledger.issue(name("alice"), core(10_000_000)).unwrap();
        ledger.issue(name("bob"), core(10_000_000)).unwrap();

        let ledger = Arc::new(Mutex::new(ledger));
        let chain = ManualChain::new(1, TimePoint::from_secs(START_SECS));
        let publisher = MemoryPublisher::new();
        let verifier = MemoryVerifier::new();
        let oracle = MemoryWeightOracle::new();
        let host = Host::new(
            ledger.clone(),
            verifier.clone(),
            publisher.clone(),
            chain.clone(),
            oracle.clone(),
        );
        let contract = SystemContract::new(config, host).unwrap();

        Self {
            contract,
            ledger,
            chain,
            publisher,
            verifier,
            oracle,
            wood_counter: 0,
        }
    }

    pub fn system(&self) -> Name {
        self.contract.config().accounts.system
    }

    pub fn apply(&mut self, signer: &str, action: Action) -> Result<ActionOutcome> {
        self.contract.apply(name(signer), action)
    }

    pub fn admin(&mut self, action: Action) -> Result<ActionOutcome> {
        let system = self.system();
        self.contract.apply(system, action)
    }

    pub fn balance(&self, account: Name) -> i64 {
        self.ledger
            .lock()
            .get_balance(&account, core_symbol())
            .unwrap()
            .amount
    }

    pub fn balance_of(&self, account: &str) -> i64 {
        self.balance(name(account))
    }

    /// Advance one block and run the block tick.
    pub fn tick(&mut self, producer: &str) -> BlockReport {
        self.chain.advance(1);
        self.contract.on_block(name(producer)).unwrap()
    }

    pub fn tick_n(&mut self, producer: &str, blocks: u32) -> Vec<BlockReport> {
        (0..blocks).map(|_| self.tick(producer)).collect()
    }

    pub fn head(&self) -> u32 {
        self.contract.head_block_num()
    }

    pub fn init(&mut self) {
        self.admin(Action::Init {
            core_symbol: core_symbol(),
            quote_balance: 10_000_000,
        })
        .unwrap();
    }

    pub fn register(&mut self, producer: &str, key_byte: u8) {
        self.apply(
            producer,
            Action::RegProducer {
                producer: name(producer),
                producer_key: key(key_byte),
                url: format!("https://{}.example", producer),
                location: key_byte as u16,
            },
        )
        .unwrap();
    }

    /// A vote with a fresh proof, mined by the voter for the current head.
    pub fn vote(&mut self, voter: &str, producer: &str) -> Result<ActionOutcome> {
        self.wood_counter += 1;
        let request = VoteRequest {
            voter: name(voter),
            wood_owner: Name::EMPTY,
            wood: format!("{:016x}", self.wood_counter),
            block_number: self.head(),
            producer: name(producer),
        };
        self.apply(voter, Action::VoteProducer(request))
    }

    /// Register bpa, bpb, bpc with one vote each and tick until the network
    /// latches active; the ticking producer is bpa.
    pub fn activate_network(&mut self) {
        for (i, producer) in ["bpa", "bpb", "bpc"].into_iter().enumerate() {
            self.register(producer, i as u8 + 1);
            self.vote("alice", producer).unwrap();
        }
        for _ in 0..40 {
            self.tick("bpa");
            if self.contract.state().global.is_network_active {
                return;
            }
        }
        panic!("network did not activate");
    }

    pub fn advance_past_cooldown(&self) {
        self.chain.advance_time((COOLDOWN_SECS + 1) * MICROS_PER_SECOND);
    }
}
