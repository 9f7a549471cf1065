//! Name auctions
//!
//! A thin bid table: the highest bidder's tokens sit with the names
//! account, outbid bidders are refunded through the outbox, and the block
//! driver periodically closes the highest bid that has gone quiet.

use crate::contract::Transition;
use crate::errors::{Result, SystemError};
use celes_treasury::Transfer;
use celes_types::{Asset, Name, TimePoint, MICROS_PER_SLOT};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BidStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameBid {
    pub name: Name,
    pub high_bidder: Name,
    pub high_bid: i64,
    pub last_bid_time: TimePoint,
    pub status: BidStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameBidTable {
    rows: BTreeMap<Name, NameBid>,
}

impl NameBidTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &Name) -> Option<&NameBid> {
        self.rows.get(name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NameBid> + '_ {
        self.rows.values()
    }

    /// Open bid with the highest amount; ties go to the smaller name.
    pub fn highest_open(&self) -> Option<&NameBid> {
        self.rows
            .values()
            .filter(|bid| bid.status == BidStatus::Open && bid.high_bid > 0)
            .fold(None, |best: Option<&NameBid>, bid| match best {
                Some(best) if best.high_bid >= bid.high_bid => Some(best),
                _ => Some(bid),
            })
    }

    fn put(&mut self, bid: NameBid) {
        self.rows.insert(bid.name, bid);
    }

    fn close(&mut self, name: &Name) {
        if let Some(bid) = self.rows.get_mut(name) {
            bid.status = BidStatus::Closed;
        }
    }
}

impl Transition<'_> {
    pub(crate) fn bid_name(&mut self, signer: Name, bidder: Name, name: Name, bid: Asset) -> Result<()> {
        self.require_auth(signer, bidder)?;
        let bid = self.core_quantity(bid)?;
        if name.is_empty() {
            return Err(SystemError::BidRejected("name must not be empty".to_string()));
        }
        if name == bidder {
            return Err(SystemError::BidRejected("cannot bid on own name".to_string()));
        }
        if self.config.accounts.is_reserved(&name) {
            return Err(SystemError::ReservedAccount(name));
        }
        self.require_funds(bidder, bid)?;

        let names = self.config.accounts.names;
        match self.state.bids.get(&name).cloned() {
            None => {
                self.state.bids.put(NameBid {
                    name,
                    high_bidder: bidder,
                    high_bid: bid.amount,
                    last_bid_time: self.now,
                    status: BidStatus::Open,
                });
            }
            Some(current) => {
                if current.status == BidStatus::Closed {
                    return Err(SystemError::BidRejected(format!(
                        "auction for {} is closed already",
                        name
                    )));
                }
                if current.high_bidder == bidder {
                    return Err(SystemError::BidRejected(format!(
                        "{} is already the highest bidder",
                        bidder
                    )));
                }
                let divisor = self.config.resources.bid_increase_divisor;
                if bid.amount - current.high_bid <= current.high_bid / divisor {
                    return Err(SystemError::BidRejected(format!(
                        "must increase bid by more than 1/{} of {}",
                        divisor, current.high_bid
                    )));
                }
                let refund = Transfer::new(
                    names,
                    current.high_bidder,
                    Asset::new(current.high_bid, bid.symbol),
                    format!("refund bid on name {}", name),
                );
                self.state.outbox.schedule(self.now, refund);
                self.state.bids.put(NameBid {
                    high_bidder: bidder,
                    high_bid: bid.amount,
                    last_bid_time: self.now,
                    ..current
                });
            }
        }
        self.transfer(bidder, names, bid, "bid name");
        debug!(target: "system", "{} bid {} on {}", bidder, bid, name);
        Ok(())
    }

    /// Close the highest open bid once it has been idle long enough.
    /// Runs at most once per `singing_ticker_sep * 6` slots.
    pub(crate) fn close_idle_auction(&mut self) -> Option<Name> {
        let interval = self.config.governance.singing_ticker_sep as u64 * 6 * MICROS_PER_SLOT;
        if self.now.micros_since(self.state.global.last_name_close) < interval {
            return None;
        }
        let idle = self.config.resources.bid_idle_micros;
        let winner = self
            .state
            .bids
            .highest_open()
            .filter(|bid| self.now.micros_since(bid.last_bid_time) > idle)
            .map(|bid| bid.name)?;

        self.state.bids.close(&winner);
        self.state.global.last_name_close = self.now;
        info!(target: "system", "auction for {} closed", winner);
        Some(winner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn name(s: &str) -> Name {
        Name::new(s).unwrap()
    }

    fn bid(target: &str, amount: i64, status: BidStatus) -> NameBid {
        NameBid {
            name: name(target),
            high_bidder: name("bidder"),
            high_bid: amount,
            last_bid_time: TimePoint::ZERO,
            status,
        }
    }

    #[test]
    fn test_highest_open_skips_closed() {
        let mut table = NameBidTable::new();
        table.put(bid("aaa", 50, BidStatus::Open));
        table.put(bid("bbb", 90, BidStatus::Closed));
        table.put(bid("ccc", 70, BidStatus::Open));
        assert_eq!(table.highest_open().unwrap().name, name("ccc"));

        table.close(&name("ccc"));
        assert_eq!(table.highest_open().unwrap().name, name("aaa"));
    }

    #[test]
    fn test_ties_prefer_smaller_name() {
        let mut table = NameBidTable::new();
        table.put(bid("bbb", 70, BidStatus::Open));
        table.put(bid("aaa", 70, BidStatus::Open));
        assert_eq!(table.highest_open().unwrap().name, name("aaa"));
    }

    proptest! {
        #[test]
        fn highest_open_is_the_largest_open_bid(
            rows in prop::collection::vec((1i64..1_000_000, any::<bool>()), 1..40),
        ) {
            let mut table = NameBidTable::new();
            let letters = b"abcdefghijklmnopqrstuvwxyz";
            for (i, (amount, open)) in rows.iter().enumerate() {
                let label = format!("n{}{}", letters[i / 26] as char, letters[i % 26] as char);
                let status = if *open { BidStatus::Open } else { BidStatus::Closed };
                table.put(bid(&label, *amount, status));
            }

            let best = rows.iter().filter(|(_, open)| *open).map(|(amount, _)| *amount).max();
            prop_assert_eq!(table.highest_open().map(|row| row.high_bid), best);
        }
    }
}
