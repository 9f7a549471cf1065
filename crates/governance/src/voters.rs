//! Voter records and proxy delegation

use crate::errors::{GovernanceError, Result};
use crate::types::VoterInfo;
use celes_types::Name;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Answers whether `owner` allows `voter` to submit wood on its behalf.
pub trait DelegationCheck {
    fn has_delegation(&self, owner: &Name, voter: &Name) -> bool;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterTable {
    rows: BTreeMap<Name, VoterInfo>,
}

impl VoterTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, owner: &Name) -> Option<&VoterInfo> {
        self.rows.get(owner)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Register `proxy` as a proxy, or withdraw its proxy status.
    pub fn reg_proxy(&mut self, proxy: Name, is_proxy: bool) -> Result<()> {
        if proxy.is_empty() {
            return Err(GovernanceError::EmptyName("proxy"));
        }
        match self.rows.get_mut(&proxy) {
            Some(row) => {
                if row.is_proxy == is_proxy {
                    return Err(GovernanceError::NoEffect("proxy status unchanged"));
                }
                if is_proxy && !row.proxy.is_empty() {
                    return Err(GovernanceError::ProxyConflict(format!(
                        "{} delegates to {} and cannot act as a proxy",
                        proxy, row.proxy
                    )));
                }
                row.is_proxy = is_proxy;
            }
            None => {
                let mut row = VoterInfo::new(proxy);
                row.is_proxy = is_proxy;
                self.rows.insert(proxy, row);
            }
        }
        debug!(target: "election", "{} proxy status set to {}", proxy, is_proxy);
        Ok(())
    }

    /// Create an empty voter row for `owner` if none exists yet.
    pub fn ensure(&mut self, owner: Name) -> &VoterInfo {
        self.rows.entry(owner).or_insert_with(|| VoterInfo::new(owner))
    }

    /// Point `voter` at `proxy`, or clear its delegation with an empty name.
    pub fn set_proxy(&mut self, voter: Name, proxy: Name) -> Result<()> {
        if voter.is_empty() {
            return Err(GovernanceError::EmptyName("voter"));
        }
        if voter == proxy {
            return Err(GovernanceError::ProxyConflict(
                "cannot proxy to self".to_string(),
            ));
        }
        if !proxy.is_empty() && !self.rows.get(&proxy).is_some_and(|p| p.is_proxy) {
            return Err(GovernanceError::ProxyConflict(format!(
                "{} is not a registered proxy",
                proxy
            )));
        }

        let row = self
            .rows
            .get_mut(&voter)
            .ok_or(GovernanceError::VoterNotFound(voter))?;
        if row.is_proxy && !proxy.is_empty() {
            return Err(GovernanceError::ProxyConflict(format!(
                "{} is a proxy and cannot delegate",
                voter
            )));
        }
        if row.proxy == proxy {
            return Err(GovernanceError::NoEffect("proxy unchanged"));
        }
        row.proxy = proxy;
        debug!(target: "election", "{} now delegates to {}", voter, proxy);
        Ok(())
    }
}

impl DelegationCheck for VoterTable {
    fn has_delegation(&self, owner: &Name, voter: &Name) -> bool {
        let delegated = self.rows.get(owner).is_some_and(|o| o.proxy == *voter);
        let is_proxy = self.rows.get(voter).is_some_and(|v| v.is_proxy);
        delegated && is_proxy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> Name {
        Name::new(s).unwrap()
    }

    #[test]
    fn test_delegation_requires_proxy_registration() {
        let mut voters = VoterTable::new();
        voters.ensure(name("alice"));
        assert!(voters.set_proxy(name("alice"), name("bob")).is_err());

        voters.reg_proxy(name("bob"), true).unwrap();
        voters.set_proxy(name("alice"), name("bob")).unwrap();
        assert!(voters.has_delegation(&name("alice"), &name("bob")));
        assert!(!voters.has_delegation(&name("bob"), &name("alice")));

        voters.reg_proxy(name("bob"), false).unwrap();
        assert!(!voters.has_delegation(&name("alice"), &name("bob")));
    }

    #[test]
    fn test_set_proxy_requires_voter_row() {
        let mut voters = VoterTable::new();
        voters.reg_proxy(name("bob"), true).unwrap();
        assert_eq!(
            voters.set_proxy(name("alice"), name("bob")),
            Err(GovernanceError::VoterNotFound(name("alice")))
        );

        // registering as a non-proxy still creates the row
        voters.reg_proxy(name("alice"), false).unwrap();
        assert!(!voters.get(&name("alice")).unwrap().is_proxy);
        voters.set_proxy(name("alice"), name("bob")).unwrap();
    }

    #[test]
    fn test_clearing_proxy() {
        let mut voters = VoterTable::new();
        voters.ensure(name("alice"));
        voters.reg_proxy(name("bob"), true).unwrap();
        voters.set_proxy(name("alice"), name("bob")).unwrap();
        voters.set_proxy(name("alice"), Name::EMPTY).unwrap();
        assert!(!voters.has_delegation(&name("alice"), &name("bob")));
        assert_eq!(
            voters.set_proxy(name("alice"), Name::EMPTY),
            Err(GovernanceError::NoEffect("proxy unchanged"))
        );
    }

    #[test]
    fn test_proxy_conflicts() {
        let mut voters = VoterTable::new();
        voters.reg_proxy(name("bob"), true).unwrap();
        voters.reg_proxy(name("carol"), true).unwrap();
        // a proxy cannot itself delegate
        assert!(matches!(
            voters.set_proxy(name("bob"), name("carol")),
            Err(GovernanceError::ProxyConflict(_))
        ));
        assert!(matches!(
            voters.set_proxy(name("bob"), name("bob")),
            Err(GovernanceError::ProxyConflict(_))
        ));
        assert_eq!(
            voters.reg_proxy(name("bob"), true),
            Err(GovernanceError::NoEffect("proxy status unchanged"))
        );
    }
}
