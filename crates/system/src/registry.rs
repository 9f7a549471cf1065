//! Producer, voter and DBP actions

use crate::contract::Transition;
use crate::effects::OracleOp;
use crate::errors::{Result, SystemError};
use celes_governance::{submit_vote, Registration, VoteReceipt, VoteRequest};
use celes_types::{Name, PublicKey};
use tracing::info;

impl Transition<'_> {
    pub(crate) fn register_producer(
        &mut self,
        signer: Name,
        producer: Name,
        producer_key: PublicKey,
        url: String,
        location: u16,
    ) -> Result<Registration> {
        self.require_auth(signer, producer)?;
        if self.config.accounts.is_reserved(&producer) {
            return Err(SystemError::ReservedAccount(producer));
        }
        let registration = self.state.governance.producers.register(
            producer,
            producer_key,
            url,
            location,
            self.now,
            &self.config.governance,
        )?;
        Ok(registration)
    }

    pub(crate) fn unregister_producer(&mut self, signer: Name, producer: Name) -> Result<()> {
        self.require_auth(signer, producer)?;
        self.state.governance.producers.deactivate(&producer)?;
        Ok(())
    }

    pub(crate) fn remove_producer(&mut self, signer: Name, producer: Name) -> Result<()> {
        self.require_system(signer)?;
        self.state.governance.producers.deactivate(&producer)?;
        info!(target: "election", "producer {} removed by {}", producer, signer);
        Ok(())
    }

    pub(crate) fn reg_proxy(&mut self, signer: Name, proxy: Name, is_proxy: bool) -> Result<()> {
        self.require_auth(signer, proxy)?;
        self.state.governance.voters.reg_proxy(proxy, is_proxy)?;
        Ok(())
    }

    pub(crate) fn set_proxy(&mut self, signer: Name, voter: Name, proxy: Name) -> Result<()> {
        self.require_auth(signer, voter)?;
        self.state.governance.voters.set_proxy(voter, proxy)?;
        Ok(())
    }

    pub(crate) fn vote_producer(&mut self, signer: Name, request: &VoteRequest) -> Result<VoteReceipt> {
        self.require_auth(signer, request.voter)?;
        let host = self.host;
        let verifier = host.proof_verifier();
        let state = &mut self.state;
        let receipt = submit_vote(
            &mut state.global,
            &mut state.governance,
            request,
            &verifier,
            self.head,
            &self.config.governance,
        )?;
        Ok(receipt)
    }

    pub(crate) fn punish(&mut self, signer: Name, owner: Name) -> Result<u16> {
        self.require_system(signer)?;
        Ok(self.state.governance.punishments.punish(owner)?)
    }

    pub(crate) fn unpunish(&mut self, signer: Name, owner: Name) -> Result<u16> {
        self.require_system(signer)?;
        Ok(self.state.governance.punishments.unpunish(&owner)?)
    }

    pub(crate) fn reg_dbp(
        &mut self,
        signer: Name,
        dbp: Name,
        url: String,
        steem_id: String,
    ) -> Result<bool> {
        self.require_auth(signer, self.config.accounts.dbp)?;
        let created = self.state.governance.dbps.register(
            dbp,
            url,
            steem_id,
            self.now,
            self.config.governance.max_url_len,
        )?;
        if created {
            self.state.global.total_dbp_count = self.state.global.total_dbp_count.saturating_add(1);
            self.effects.oracle.push(OracleOp::Register(dbp));
        }
        Ok(created)
    }

    /// Either the DBP itself or the DBP authority may unregister.
    pub(crate) fn unreg_dbp(&mut self, signer: Name, dbp: Name) -> Result<()> {
        if signer != dbp {
            self.require_auth(signer, self.config.accounts.dbp)?;
        }
        self.state.governance.dbps.unregister(&dbp)?;
        self.state.global.total_dbp_count = self.state.global.total_dbp_count.saturating_sub(1);
        self.effects.oracle.push(OracleOp::Unregister(dbp));
        Ok(())
    }

    pub(crate) fn update_revision(&mut self, signer: Name, revision: u8) -> Result<()> {
        self.require_system(signer)?;
        let current = self.state.global.revision;
        if current == u8::MAX || revision != current + 1 {
            return Err(SystemError::InvalidRevision {
                current,
                requested: revision,
            });
        }
        self.state.global.revision = revision;
        info!(target: "system", "revision advanced to {}", revision);
        Ok(())
    }
}
