//! Actions accepted by the system core

use crate::block::BlockReport;
use crate::contract::SystemContract;
use crate::errors::Result;
use crate::resources::ResourceTrade;
use crate::rewards::ClaimReceipt;
use celes_governance::{Registration, VoteReceipt, VoteRequest};
use celes_types::{Asset, Name, PublicKey, Symbol, TimePoint};
use serde::{Deserialize, Serialize};

/// One signed request. Authority is checked against the signer the host
/// authenticated, never against fields of the action itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Init {
        core_symbol: Symbol,
        quote_balance: i64,
    },
    RegProducer {
        producer: Name,
        producer_key: PublicKey,
        #[serde(default)]
        url: String,
        #[serde(default)]
        location: u16,
    },
    UnregProducer {
        producer: Name,
    },
    RemoveProducer {
        producer: Name,
    },
    RegProxy {
        proxy: Name,
        is_proxy: bool,
    },
    SetProxy {
        voter: Name,
        #[serde(default)]
        proxy: Name,
    },
    VoteProducer(VoteRequest),
    ClaimRewards {
        owner: Name,
    },
    Punish {
        owner: Name,
    },
    Unpunish {
        owner: Name,
    },
    RegDbp {
        dbp: Name,
        #[serde(default)]
        url: String,
        #[serde(default)]
        steem_id: String,
    },
    UnregDbp {
        dbp: Name,
    },
    ActivateDbp,
    BuyResource {
        payer: Name,
        receiver: Name,
        quantity: Asset,
    },
    SellResource {
        account: Name,
        units: u64,
    },
    SetResourceMax {
        max_ram_size: u64,
    },
    SetResourceRate {
        units_per_block: u16,
    },
    UpdateRevision {
        revision: u8,
    },
    Stake {
        owner: Name,
        quantity: Asset,
    },
    Unstake {
        owner: Name,
        quantity: Asset,
    },
    BidName {
        bidder: Name,
        name: Name,
        bid: Asset,
    },
    OnBlock {
        producer: Name,
    },
}

impl Action {
    pub fn label(&self) -> &'static str {
        match self {
            Action::Init { .. } => "init",
            Action::RegProducer { .. } => "reg_producer",
            Action::UnregProducer { .. } => "unreg_producer",
            Action::RemoveProducer { .. } => "remove_producer",
            Action::RegProxy { .. } => "reg_proxy",
            Action::SetProxy { .. } => "set_proxy",
            Action::VoteProducer(_) => "vote_producer",
            Action::ClaimRewards { .. } => "claim_rewards",
            Action::Punish { .. } => "punish",
            Action::Unpunish { .. } => "unpunish",
            Action::RegDbp { .. } => "reg_dbp",
            Action::UnregDbp { .. } => "unreg_dbp",
            Action::ActivateDbp => "activate_dbp",
            Action::BuyResource { .. } => "buy_resource",
            Action::SellResource { .. } => "sell_resource",
            Action::SetResourceMax { .. } => "set_resource_max",
            Action::SetResourceRate { .. } => "set_resource_rate",
            Action::UpdateRevision { .. } => "update_revision",
            Action::Stake { .. } => "stake",
            Action::Unstake { .. } => "unstake",
            Action::BidName { .. } => "bid_name",
            Action::OnBlock { .. } => "on_block",
        }
    }
}

/// What a successfully applied action produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ActionOutcome {
    Done,
    ProducerRegistered { created: bool },
    Voted(VoteReceipt),
    Claimed(ClaimReceipt),
    PunishCount { count: u16 },
    DbpRegistered { created: bool },
    DbpActivated { returned: Option<Asset> },
    Traded(ResourceTrade),
    Staked { total: Asset },
    Unstaked { refund_due: TimePoint },
    Block(BlockReport),
}

impl SystemContract {
    /// Apply one action signed by `signer` as an all-or-nothing transition.
    pub fn apply(&mut self, signer: Name, action: Action) -> Result<ActionOutcome> {
        let label = action.label();
        self.execute(label, move |tx| match action {
            Action::Init {
                core_symbol,
                quote_balance,
            } => tx
                .init(signer, core_symbol, quote_balance)
                .map(|_| ActionOutcome::Done),
            Action::RegProducer {
                producer,
                producer_key,
                url,
                location,
            } => tx
                .register_producer(signer, producer, producer_key, url, location)
                .map(|registration| ActionOutcome::ProducerRegistered {
                    created: registration == Registration::Created,
                }),
            Action::UnregProducer { producer } => tx
                .unregister_producer(signer, producer)
                .map(|_| ActionOutcome::Done),
            Action::RemoveProducer { producer } => tx
                .remove_producer(signer, producer)
                .map(|_| ActionOutcome::Done),
            Action::RegProxy { proxy, is_proxy } => tx
                .reg_proxy(signer, proxy, is_proxy)
                .map(|_| ActionOutcome::Done),
            Action::SetProxy { voter, proxy } => tx
                .set_proxy(signer, voter, proxy)
                .map(|_| ActionOutcome::Done),
            Action::VoteProducer(request) => {
                tx.vote_producer(signer, &request).map(ActionOutcome::Voted)
            }
            Action::ClaimRewards { owner } => {
                tx.claim_rewards(signer, owner).map(ActionOutcome::Claimed)
            }
            Action::Punish { owner } => tx
                .punish(signer, owner)
                .map(|count| ActionOutcome::PunishCount { count }),
            Action::Unpunish { owner } => tx
                .unpunish(signer, owner)
                .map(|count| ActionOutcome::PunishCount { count }),
            Action::RegDbp { dbp, url, steem_id } => tx
                .reg_dbp(signer, dbp, url, steem_id)
                .map(|created| ActionOutcome::DbpRegistered { created }),
            Action::UnregDbp { dbp } => tx.unreg_dbp(signer, dbp).map(|_| ActionOutcome::Done),
            Action::ActivateDbp => tx
                .activate_dbp(signer)
                .map(|returned| ActionOutcome::DbpActivated { returned }),
            Action::BuyResource {
                payer,
                receiver,
                quantity,
            } => tx
                .buy_resource(signer, payer, receiver, quantity)
                .map(ActionOutcome::Traded),
            Action::SellResource { account, units } => tx
                .sell_resource(signer, account, units)
                .map(ActionOutcome::Traded),
            Action::SetResourceMax { max_ram_size } => tx
                .set_resource_max(signer, max_ram_size)
                .map(|_| ActionOutcome::Done),
            Action::SetResourceRate { units_per_block } => tx
                .set_resource_rate(signer, units_per_block)
                .map(|_| ActionOutcome::Done),
            Action::UpdateRevision { revision } => tx
                .update_revision(signer, revision)
                .map(|_| ActionOutcome::Done),
            Action::Stake { owner, quantity } => tx
                .stake(signer, owner, quantity)
                .map(|total| ActionOutcome::Staked { total }),
            Action::Unstake { owner, quantity } => tx
                .unstake(signer, owner, quantity)
                .map(|refund_due| ActionOutcome::Unstaked { refund_due }),
            Action::BidName { bidder, name, bid } => tx
                .bid_name(signer, bidder, name, bid)
                .map(|_| ActionOutcome::Done),
            Action::OnBlock { producer } => {
                tx.require_system(signer)?;
                tx.on_block(producer).map(ActionOutcome::Block)
            }
        })
    }

    /// Block tick issued by the host itself.
    pub fn on_block(&mut self, producer: Name) -> Result<BlockReport> {
        self.execute("on_block", |tx| tx.on_block(producer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actions_parse_from_json() {
        let action: Action = serde_json::from_str(
            r#"{"action": "buy_resource", "payer": "alice", "receiver": "bob", "quantity": "1.0000 CELES"}"#,
        )
        .unwrap();
        assert_eq!(action.label(), "buy_resource");

        let action: Action = serde_json::from_str(
            r#"{"action": "vote_producer", "voter": "alice", "wood": "00ff", "block_number": 7, "producer": "bpa"}"#,
        )
        .unwrap();
        match action {
            Action::VoteProducer(request) => {
                assert_eq!(request.owner(), Name::new("alice").unwrap());
                assert_eq!(request.block_number, 7);
            }
            other => panic!("unexpected action {:?}", other),
        }

        let action: Action = serde_json::from_str(r#"{"action": "activate_dbp"}"#).unwrap();
        assert_eq!(action, Action::ActivateDbp);
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        assert!(serde_json::from_str::<Action>(r#"{"action": "selfdestruct"}"#).is_err());
    }
}
