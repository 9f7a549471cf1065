//! Complete state of the system core

use crate::auction::NameBidTable;
use celes_economics::ResourceMarket;
use celes_governance::GovernanceState;
use celes_treasury::Outbox;
use celes_types::{GlobalState, Name, Symbol};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything a transition reads or writes, apart from ledger balances.
///
/// Serialises as one document; the node persists it after every applied
/// action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemState {
    pub global: GlobalState,
    pub governance: GovernanceState,
    pub market: ResourceMarket,
    /// Set once by genesis initialisation
    pub core_symbol: Option<Symbol>,
    /// Resource units owned per account
    pub resources: BTreeMap<Name, u64>,
    /// Core tokens staked per account
    pub stakes: BTreeMap<Name, i64>,
    pub bids: NameBidTable,
    pub outbox: Outbox,
}

impl SystemState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.core_symbol.is_some()
    }

    pub fn resource_of(&self, owner: &Name) -> u64 {
        self.resources.get(owner).copied().unwrap_or(0)
    }

    pub fn stake_of(&self, owner: &Name) -> i64 {
        self.stakes.get(owner).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_survives_json() {
        let mut state = SystemState::new();
        let alice = Name::new("alice").unwrap();
        state.resources.insert(alice, 4096);
        state.stakes.insert(alice, 10_000);
        state.core_symbol = Some(Symbol::new("CELES", 4).unwrap());
        state
            .governance
            .voters
            .reg_proxy(alice, true)
            .unwrap();

        let json = serde_json::to_string(&state).unwrap();
        let restored: SystemState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, state);
        assert_eq!(restored.resource_of(&alice), 4096);
        assert_eq!(restored.stake_of(&Name::new("bob").unwrap()), 0);
    }
}
