//! Staking and delayed refunds

use crate::contract::Transition;
use crate::errors::{Result, SystemError};
use celes_treasury::{ScheduledTransfer, Transfer};
use celes_types::{Asset, Name, TimePoint};
use tracing::{debug, info};

impl Transition<'_> {
    /// Lock core tokens with the stake account. Creates the voter row.
    pub(crate) fn stake(&mut self, signer: Name, owner: Name, quantity: Asset) -> Result<Asset> {
        self.require_auth(signer, owner)?;
        let quantity = self.core_quantity(quantity)?;
        self.require_funds(owner, quantity)?;

        let staked = self.state.stakes.entry(owner).or_insert(0);
        *staked = staked.saturating_add(quantity.amount);
        let total = Asset::new(*staked, quantity.symbol);
        self.state.governance.voters.ensure(owner);

        let stake_account = self.config.accounts.stake;
        self.transfer(owner, stake_account, quantity, "stake");
        debug!(target: "system", "{} staked {}, total {}", owner, quantity, total);
        Ok(total)
    }

    /// Release staked tokens; the refund is paid once the refund delay passed.
    pub(crate) fn unstake(&mut self, signer: Name, owner: Name, quantity: Asset) -> Result<TimePoint> {
        self.require_auth(signer, owner)?;
        let quantity = self.core_quantity(quantity)?;
        let staked = self.state.stake_of(&owner);
        if staked < quantity.amount {
            return Err(SystemError::InsufficientStake {
                account: owner,
                staked: Asset::new(staked, quantity.symbol),
                requested: quantity,
            });
        }
        if staked == quantity.amount {
            self.state.stakes.remove(&owner);
        } else {
            self.state.stakes.insert(owner, staked - quantity.amount);
        }

        let due = self.now + self.config.resources.refund_delay_micros;
        let refund = Transfer::new(self.config.accounts.stake, owner, quantity, "unstake");
        let id = self.state.outbox.schedule(due, refund);
        info!(target: "system", "{} unstaked {}, refund {} due at {}", owner, quantity, id, due);
        Ok(due)
    }

    /// Move every outbox entry due by now into the journal, oldest first.
    pub(crate) fn drain_outbox(&mut self) -> Vec<ScheduledTransfer> {
        let due = self.state.outbox.drain_due(self.now);
        for entry in &due {
            self.effects.transfer(entry.transfer.clone());
        }
        if !due.is_empty() {
            debug!(target: "system", "released {} deferred transfers", due.len());
        }
        due
    }
}
