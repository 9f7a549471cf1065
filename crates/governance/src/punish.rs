//! Punishment counters lengthening the claim cool-down

use crate::errors::{GovernanceError, Result};
use celes_types::Name;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PunishTable {
    counts: BTreeMap<Name, u16>,
}

impl PunishTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outstanding punishments of `owner`, zero if none.
    pub fn count(&self, owner: &Name) -> u16 {
        self.counts.get(owner).copied().unwrap_or(0)
    }

    /// Add one punishment and return the new count.
    pub fn punish(&mut self, owner: Name) -> Result<u16> {
        if owner.is_empty() {
            return Err(GovernanceError::EmptyName("owner"));
        }
        let count = self.counts.entry(owner).or_insert(0);
        *count = count.saturating_add(1);
        info!(target: "rewards", "{} punished, count {}", owner, count);
        Ok(*count)
    }

    /// Remove one punishment; the row goes away when it reaches zero.
    pub fn unpunish(&mut self, owner: &Name) -> Result<u16> {
        let count = self
            .counts
            .get_mut(owner)
            .ok_or(GovernanceError::NotPunished(*owner))?;
        *count -= 1;
        let remaining = *count;
        if remaining == 0 {
            self.counts.remove(owner);
        }
        info!(target: "rewards", "{} unpunished, count {}", owner, remaining);
        Ok(remaining)
    }

    /// Drop every punishment of `owner`, returning how many there were.
    pub fn clear(&mut self, owner: &Name) -> u16 {
        self.counts.remove(owner).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_punish_cycle() {
        let bp = Name::new("bp").unwrap();
        let mut table = PunishTable::new();
        assert_eq!(table.count(&bp), 0);
        assert_eq!(table.punish(bp).unwrap(), 1);
        assert_eq!(table.punish(bp).unwrap(), 2);
        assert_eq!(table.unpunish(&bp).unwrap(), 1);
        assert_eq!(table.unpunish(&bp).unwrap(), 0);
        assert_eq!(table.unpunish(&bp), Err(GovernanceError::NotPunished(bp)));
        assert_eq!(table, PunishTable::new());
    }

    #[test]
    fn test_clear() {
        let bp = Name::new("bp").unwrap();
        let mut table = PunishTable::new();
        table.punish(bp).unwrap();
        table.punish(bp).unwrap();
        assert_eq!(table.clear(&bp), 2);
        assert_eq!(table.count(&bp), 0);
    }
}
