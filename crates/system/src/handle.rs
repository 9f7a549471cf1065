//! Shared single-writer handle

use crate::action::{Action, ActionOutcome};
use crate::block::BlockReport;
use crate::contract::SystemContract;
use crate::errors::Result;
use crate::state::SystemState;
use celes_types::Name;
use parking_lot::Mutex;
use std::sync::Arc;

/// Serialises transitions for hosts that call in from several threads.
#[derive(Clone)]
pub struct SystemHandle {
    inner: Arc<Mutex<SystemContract>>,
}

impl SystemHandle {
    pub fn new(contract: SystemContract) -> Self {
        Self {
            inner: Arc::new(Mutex::new(contract)),
        }
    }

    pub fn apply(&self, signer: Name, action: Action) -> Result<ActionOutcome> {
        self.inner.lock().apply(signer, action)
    }

    pub fn on_block(&self, producer: Name) -> Result<BlockReport> {
        self.inner.lock().on_block(producer)
    }

    /// Copy of the live state, e.g. for persisting.
    pub fn snapshot(&self) -> SystemState {
        self.inner.lock().state().clone()
    }

    /// Read the live state without copying it.
    pub fn with_state<R>(&self, f: impl FnOnce(&SystemState) -> R) -> R {
        f(self.inner.lock().state())
    }
}
