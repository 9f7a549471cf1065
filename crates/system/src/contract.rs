//! Transition engine
//!
//! Every action and block tick runs as a [`Transition`]: a working copy of
//! [`SystemState`] plus an [`Effects`] journal. Only when the transition
//! returns `Ok` is the journal committed to the collaborators and the working
//! copy swapped in. Any error, including a collaborator failure during the
//! commit, leaves the live state untouched.

use crate::config::SystemConfig;
use crate::effects::Effects;
use crate::errors::{Result, SystemError};
use crate::host::{ChainHead, ResourceWeightOracle, SchedulePublisher, WoodVerifier};
use crate::state::SystemState;
use celes_governance::ProofVerifier;
use celes_treasury::{TokenLedger, Transfer};
use celes_types::{Asset, BlockNum, Name, Symbol, TimePoint};
use tracing::{debug, warn};

/// The collaborators a contract talks to.
pub struct Host {
    pub ledger: Box<dyn TokenLedger>,
    pub verifier: Box<dyn WoodVerifier>,
    pub publisher: Box<dyn SchedulePublisher>,
    pub chain: Box<dyn ChainHead>,
    pub oracle: Box<dyn ResourceWeightOracle>,
}

impl Host {
    pub(crate) fn proof_verifier(&self) -> VerifierRef<'_> {
        VerifierRef(self.verifier.as_ref())
    }

    pub fn new(
        ledger: impl TokenLedger + 'static,
        verifier: impl WoodVerifier + 'static,
        publisher: impl SchedulePublisher + 'static,
        chain: impl ChainHead + 'static,
        oracle: impl ResourceWeightOracle + 'static,
    ) -> Self {
        Self {
            ledger: Box::new(ledger),
            verifier: Box::new(verifier),
            publisher: Box::new(publisher),
            chain: Box::new(chain),
            oracle: Box::new(oracle),
        }
    }
}

/// One in-flight state transition.
pub(crate) struct Transition<'a> {
    pub(crate) state: SystemState,
    pub(crate) effects: Effects,
    pub(crate) host: &'a Host,
    pub(crate) config: &'a SystemConfig,
    pub(crate) head: BlockNum,
    pub(crate) now: TimePoint,
}

impl<'a> Transition<'a> {
    pub(crate) fn require_auth(&self, signer: Name, account: Name) -> Result<()> {
        if signer != account {
            return Err(SystemError::MissingAuthority(account));
        }
        Ok(())
    }

    pub(crate) fn require_system(&self, signer: Name) -> Result<()> {
        self.require_auth(signer, self.config.accounts.system)
    }

    pub(crate) fn core_symbol(&self) -> Result<Symbol> {
        self.state.core_symbol.ok_or(SystemError::NotInitialized)
    }

    /// A positive quantity in the core denomination.
    pub(crate) fn core_quantity(&self, quantity: Asset) -> Result<Asset> {
        let symbol = self.core_symbol()?;
        if quantity.symbol != symbol {
            return Err(SystemError::InvalidQuantity(format!(
                "expected {}, got {}",
                symbol, quantity.symbol
            )));
        }
        if quantity.amount <= 0 || !quantity.is_amount_within_range() {
            return Err(SystemError::InvalidQuantity(format!(
                "{} must be positive",
                quantity
            )));
        }
        Ok(quantity)
    }

    /// Ledger balance as it will be once the journal so far is committed.
    pub(crate) fn balance(&self, account: &Name, symbol: Symbol) -> Result<i64> {
        let settled = self.host.ledger.get_balance(account, symbol)?;
        Ok(settled
            .amount
            .saturating_add(self.effects.net_delta(account, symbol)))
    }

    pub(crate) fn require_funds(&self, account: Name, needed: Asset) -> Result<()> {
        let available = self.balance(&account, needed.symbol)?;
        if available < needed.amount {
            return Err(SystemError::InsufficientFunds {
                account,
                available: Asset::new(available, needed.symbol),
                needed,
            });
        }
        Ok(())
    }

    pub(crate) fn transfer(&mut self, from: Name, to: Name, quantity: Asset, memo: &str) {
        self.effects.transfer(Transfer::new(from, to, quantity, memo));
    }
}

/// Borrowed view of the host verifier as a plain [`ProofVerifier`].
pub(crate) struct VerifierRef<'a>(&'a dyn WoodVerifier);

impl ProofVerifier for VerifierRef<'_> {
    fn verify(&self, block_number: BlockNum, owner: &Name, wood: &str) -> bool {
        self.0.verify(block_number, owner, wood)
    }
}

/// Owner of the live state and of the collaborators.
pub struct SystemContract {
    state: SystemState,
    config: SystemConfig,
    host: Host,
}

impl SystemContract {
    pub fn new(config: SystemConfig, host: Host) -> Result<Self> {
        Self::from_state(SystemState::new(), config, host)
    }

    /// Resume from a previously persisted state.
    pub fn from_state(state: SystemState, config: SystemConfig, host: Host) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            state,
            config,
            host,
        })
    }

    pub fn state(&self) -> &SystemState {
        &self.state
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut Host {
        &mut self.host
    }

    pub fn head_block_num(&self) -> BlockNum {
        self.host.chain.head_block_num()
    }

    /// Run `f` as one all-or-nothing transition.
    pub(crate) fn execute<T>(
        &mut self,
        label: &str,
        f: impl FnOnce(&mut Transition<'_>) -> Result<T>,
    ) -> Result<T> {
        let head = self.host.chain.head_block_num();
        let now = self.host.chain.current_time();
        let mut tx = Transition {
            state: self.state.clone(),
            effects: Effects::new(),
            host: &self.host,
            config: &self.config,
            head,
            now,
        };

        let value = match f(&mut tx) {
            Ok(value) => value,
            Err(err) => {
                warn!(target: "system", "{} at block {} rejected: {}", label, head, err);
                return Err(err);
            }
        };

        let Transition { state, effects, .. } = tx;
        let host = &mut self.host;
        if let Err(err) = effects.commit(
            host.ledger.as_mut(),
            host.publisher.as_mut(),
            host.verifier.as_mut(),
            host.oracle.as_mut(),
        ) {
            warn!(target: "system", "{} at block {} rolled back: {}", label, head, err);
            return Err(err);
        }

        self.state = state;
        debug!(target: "system", "{} at block {} committed", label, head);
        Ok(value)
    }
}
