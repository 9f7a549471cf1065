use crate::dbp::DbpTable;
use crate::producers::ProducerTable;
use crate::punish::PunishTable;
use crate::voters::VoterTable;
use crate::wood::WoodLedger;
use serde::{Deserialize, Serialize};

/// All governance tables, owned together by the transition engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GovernanceState {
    pub producers: ProducerTable,
    pub voters: VoterTable,
    pub wood: WoodLedger,
    pub punishments: PunishTable,
    pub dbps: DbpTable,
}

impl GovernanceState {
    pub fn new() -> Self {
        Self::default()
    }
}
