//! Dapp block producer (DBP) registry

use crate::errors::{GovernanceError, Result};
use crate::types::DbpInfo;
use celes_types::{Name, TimePoint};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbpTable {
    rows: BTreeMap<Name, DbpInfo>,
}

impl DbpTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, owner: &Name) -> Option<&DbpInfo> {
        self.rows.get(owner)
    }

    pub fn contains(&self, owner: &Name) -> bool {
        self.rows.contains_key(owner)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn owners(&self) -> impl Iterator<Item = Name> + '_ {
        self.rows.keys().copied()
    }

    /// Register or refresh a DBP. Returns true if the row is new.
    pub fn register(
        &mut self,
        owner: Name,
        url: String,
        steem_id: String,
        now: TimePoint,
        max_url_len: usize,
    ) -> Result<bool> {
        if owner.is_empty() {
            return Err(GovernanceError::EmptyName("dbp"));
        }
        if url.len() >= max_url_len {
            return Err(GovernanceError::UrlTooLong {
                len: url.len(),
                max: max_url_len,
            });
        }
        let created = !self.rows.contains_key(&owner);
        self.rows.insert(
            owner,
            DbpInfo {
                owner,
                url,
                steem_id,
                last_claim_time: now,
            },
        );
        if created {
            info!(target: "rewards", "dbp {} registered", owner);
        }
        Ok(created)
    }

    pub fn unregister(&mut self, owner: &Name) -> Result<DbpInfo> {
        let row = self
            .rows
            .remove(owner)
            .ok_or(GovernanceError::UnknownDbp(*owner))?;
        info!(target: "rewards", "dbp {} unregistered", owner);
        Ok(row)
    }

    pub fn touch_claim(&mut self, owner: &Name, now: TimePoint) -> Result<()> {
        let row = self
            .rows
            .get_mut(owner)
            .ok_or(GovernanceError::UnknownDbp(*owner))?;
        row.last_claim_time = now;
        Ok(())
    }
}
