//! Reward top-ups, claims and DBP activation

use crate::contract::Transition;
use crate::effects::OracleOp;
use crate::errors::{Result, SystemError};
use celes_economics::{
    claim_cooldown_micros, compute_claim, cooldown_elapsed, pool_emission, ClaimInputs,
    ClaimPayout, DappStanding, PoolEmission, RewardPoolKind,
};
use celes_types::{Asset, Name, Symbol, MICROS_PER_SECOND};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// What a claim actually paid; components whose accrual account could not
/// cover them are zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimReceipt {
    pub owner: Name,
    pub paid: ClaimPayout,
    /// Punishments cleared by this claim
    pub punishments_cleared: u16,
}

impl Transition<'_> {
    /// Emission of one pool for this block, as a journalled transfer.
    fn top_up_pool(&mut self, pool: RewardPoolKind, symbol: Symbol) -> Result<Option<PoolEmission>> {
        let holding = self.config.accounts.pool_account(pool);
        let balance = self.balance(&holding, symbol)?;
        let Some(emission) = pool_emission(pool, balance, &self.config.economics) else {
            return Ok(None);
        };
        let transfer = self.config.accounts.top_up(&emission, symbol);
        self.effects.transfer(transfer);
        debug!(
            target: "rewards",
            "{}: balance {} halftime {} emits {}",
            pool, emission.balance, emission.halftime, emission.amount
        );
        Ok(Some(emission))
    }

    /// Per-block inflation. Block and wood pay need a registered producer;
    /// the dapp pool is topped up regardless.
    pub(crate) fn top_up_rewards(&mut self, producer: Name) -> Result<Vec<PoolEmission>> {
        let mut emissions = Vec::new();
        let Some(symbol) = self.state.core_symbol else {
            return Ok(emissions);
        };
        if !self.state.global.is_network_active {
            return Ok(emissions);
        }

        if self.state.governance.producers.contains(&producer) {
            if let Some(emission) = self.top_up_pool(RewardPoolKind::BlockPay, symbol)? {
                let amount = emission.amount as u64;
                let global = &mut self.state.global;
                global.total_unpaid_block_fee = global.total_unpaid_block_fee.saturating_add(amount);
                self.state
                    .governance
                    .producers
                    .update(&producer, |p| {
                        p.unpaid_block_fee = p.unpaid_block_fee.saturating_add(amount)
                    })?;
                emissions.push(emission);
            }
            if let Some(emission) = self.top_up_pool(RewardPoolKind::WoodPay, symbol)? {
                emissions.push(emission);
            }
        }
        if let Some(emission) = self.top_up_pool(RewardPoolKind::DappPay, symbol)? {
            emissions.push(emission);
        }
        Ok(emissions)
    }

    pub(crate) fn claim_rewards(&mut self, signer: Name, owner: Name) -> Result<ClaimReceipt> {
        self.require_auth(signer, owner)?;
        let symbol = self.core_symbol()?;
        if !self.state.global.is_network_active {
            return Err(SystemError::NetworkInactive);
        }

        let gov = &self.state.governance;
        let producer = gov.producers.get(&owner).filter(|p| p.is_active).cloned();
        let dbp = gov.dbps.get(&owner).cloned();
        if producer.is_none() && dbp.is_none() {
            return Err(SystemError::NotClaimant(owner));
        }

        let config = self.config;
        let params = &config.economics;
        let punish_count = gov.punishments.count(&owner);
        let now = self.now.as_micros();
        let last_claims = producer
            .iter()
            .map(|p| p.last_claim_time)
            .chain(dbp.iter().map(|d| d.last_claim_time));
        for last in last_claims {
            if !cooldown_elapsed(now, last.as_micros(), punish_count, params) {
                return Err(SystemError::TooSoon {
                    owner,
                    cooldown_secs: claim_cooldown_micros(params, punish_count) / MICROS_PER_SECOND,
                });
            }
        }

        let accounts = &config.accounts;
        let block_balance = self.balance(&accounts.block_pay, symbol)?;
        let wood_balance = self.balance(&accounts.wood_pay, symbol)?;
        let dapp_balance = self.balance(&accounts.dapp_pay, symbol)?;

        let dapp = match &dbp {
            None => DappStanding::NotRegistered,
            Some(_) if !self.state.global.is_dbp_active => DappStanding::PreActivation,
            Some(_) => DappStanding::Active {
                unpaid_weight: self.host.oracle.unpaid_weight(&owner),
                total_unpaid_weight: self.host.oracle.total_unpaid_weight(),
            },
        };
        let inputs = ClaimInputs {
            unpaid_block_fee: producer.as_ref().map_or(0, |p| p.unpaid_block_fee),
            block_accrual_balance: block_balance,
            unpaid_wood: producer.as_ref().map_or(0, |p| p.unpaid_wood),
            total_unpaid_wood: self.state.global.total_unpaid_wood,
            wood_accrual_balance: wood_balance,
            dapp,
            dapp_accrual_balance: dapp_balance,
        };
        let payout = compute_claim(&inputs, params);
        if payout.is_empty() {
            debug!(
                target: "rewards",
                "{} claims nothing: accruals block {} wood {} dapp {}",
                owner, block_balance, wood_balance, dapp_balance
            );
        }

        let mut paid = ClaimPayout::default();
        if self.pay(RewardPoolKind::BlockPay, owner, payout.block_pay, symbol) {
            paid.block_pay = payout.block_pay;
            let global = &mut self.state.global;
            global.total_unpaid_block_fee = global
                .total_unpaid_block_fee
                .saturating_sub(payout.block_pay as u64);
            self.state
                .governance
                .producers
                .update(&owner, |p| p.unpaid_block_fee = 0)?;
        }
        if self.pay(RewardPoolKind::WoodPay, owner, payout.wood_pay, symbol) {
            paid.wood_pay = payout.wood_pay;
            let global = &mut self.state.global;
            global.total_unpaid_wood = global.total_unpaid_wood.saturating_sub(inputs.unpaid_wood);
            self.state
                .governance
                .producers
                .update(&owner, |p| p.unpaid_wood = 0)?;
        }
        if self.pay(RewardPoolKind::DappPay, owner, payout.dapp_pay, symbol) {
            paid.dapp_pay = payout.dapp_pay;
            self.effects.oracle.push(OracleOp::MarkClaimed(owner));
        }

        let now = self.now;
        if producer.is_some() {
            self.state
                .governance
                .producers
                .update(&owner, |p| p.last_claim_time = now)?;
        }
        if dbp.is_some() {
            self.state.governance.dbps.touch_claim(&owner, now)?;
        }
        let punishments_cleared = self.state.governance.punishments.clear(&owner);

        info!(
            target: "rewards",
            "{} claimed block {} wood {} dapp {}",
            owner, paid.block_pay, paid.wood_pay, paid.dapp_pay
        );
        Ok(ClaimReceipt {
            owner,
            paid,
            punishments_cleared,
        })
    }

    /// Journal a non-zero payout. `compute_claim` already capped it by the
    /// accrual balance.
    fn pay(&mut self, pool: RewardPoolKind, owner: Name, amount: i64, symbol: Symbol) -> bool {
        if amount <= 0 {
            return false;
        }
        let transfer = self.config.accounts.payout(pool, owner, amount, symbol);
        self.effects.transfer(transfer);
        true
    }

    /// Admin activation of the DBP reward class.
    pub(crate) fn activate_dbp(&mut self, signer: Name) -> Result<Option<Asset>> {
        self.require_system(signer)?;
        self.start_dbp_rewards()
    }

    /// Latch DBP activation and return the dapp accrual balance to its pool.
    /// The returned amount is `None` before genesis initialisation.
    pub(crate) fn start_dbp_rewards(&mut self) -> Result<Option<Asset>> {
        if self.state.global.is_dbp_active {
            return Err(SystemError::DbpAlreadyActive);
        }
        if !self.state.global.is_network_active {
            return Err(SystemError::NetworkInactive);
        }
        let global = &mut self.state.global;
        global.is_dbp_active = true;
        global.dbp_active_block = self.head;

        let mut returned = None;
        if let Some(symbol) = self.state.core_symbol {
            let accounts = &self.config.accounts;
            let (dapp_pay, dapp_pay_pool) = (accounts.dapp_pay, accounts.dapp_pay_pool);
            let balance = self.balance(&dapp_pay, symbol)?;
            let amount = Asset::new(balance.max(0), symbol);
            if balance > 0 {
                self.transfer(dapp_pay, dapp_pay_pool, amount, RewardPoolKind::DappPay.label());
            }
            returned = Some(amount);
        }
        info!(target: "rewards", "dbp rewards active at block {}", self.head);
        Ok(returned)
    }

    /// Automatic DBP activation once the network has been active long enough.
    pub(crate) fn maybe_start_dbp_rewards(&mut self) -> Result<bool> {
        let global = &self.state.global;
        if global.is_dbp_active || !global.is_network_active {
            return Ok(false);
        }
        if self.head.saturating_sub(global.network_active_block) < self.config.governance.dbp_active_sep {
            return Ok(false);
        }
        self.start_dbp_rewards()?;
        Ok(true)
    }
}
