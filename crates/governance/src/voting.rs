//! Wood submission: consume a proof and attribute one vote to a producer

use crate::compactor::{compact_expired, CompactionReport};
use crate::errors::{GovernanceError, Result};
use crate::parameters::GovernanceParams;
use crate::state::GovernanceState;
use crate::voters::DelegationCheck;
use crate::wood::ProofVerifier;
use celes_types::{BlockNum, GlobalState, Name};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A vote as submitted by `voter`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRequest {
    pub voter: Name,
    /// Account the proof was mined for; empty means the voter itself
    #[serde(default)]
    pub wood_owner: Name,
    pub wood: String,
    pub block_number: BlockNum,
    pub producer: Name,
}

impl VoteRequest {
    /// Account the proof is attributed to.
    pub fn owner(&self) -> Name {
        if self.wood_owner.is_empty() {
            self.voter
        } else {
            self.wood_owner
        }
    }
}

/// What an accepted vote changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteReceipt {
    pub burn_id: u64,
    pub owner: Name,
    /// Producer's live vote weight after this vote
    pub producer_votes: u64,
    /// Opportunistic cleanup performed after the vote, if the chain is old enough
    pub compaction: Option<CompactionReport>,
}

/// Validate and record one vote.
///
/// Every check runs before the first mutation, so a rejected vote leaves
/// all tables untouched.
pub fn submit_vote(
    global: &mut GlobalState,
    gov: &mut GovernanceState,
    request: &VoteRequest,
    verifier: &dyn ProofVerifier,
    head: BlockNum,
    params: &GovernanceParams,
) -> Result<VoteReceipt> {
    if request.producer.is_empty() {
        return Err(GovernanceError::EmptyName("producer"));
    }
    if request.wood.is_empty() {
        return Err(GovernanceError::EmptyProof);
    }
    if request.wood.len() > params.max_wood_len {
        return Err(GovernanceError::ProofTooLong {
            len: request.wood.len(),
            max: params.max_wood_len,
        });
    }

    let owner = request.owner();
    if owner != request.voter && !gov.voters.has_delegation(&owner, &request.voter) {
        return Err(GovernanceError::DelegationMismatch {
            owner,
            voter: request.voter,
        });
    }

    if gov
        .wood
        .burns
        .contains(&request.wood, request.block_number, &owner)
    {
        return Err(GovernanceError::DuplicateProof {
            wood: request.wood.clone(),
            block_number: request.block_number,
            owner,
        });
    }
    if !verifier.verify(request.block_number, &owner, &request.wood) {
        return Err(GovernanceError::InvalidProof {
            block_number: request.block_number,
            owner,
        });
    }

    let producer = gov.producers.require(&request.producer)?;
    if !producer.is_active {
        return Err(GovernanceError::InactiveProducer(request.producer));
    }

    let producer_votes = gov
        .producers
        .update(&request.producer, |p| {
            p.total_votes += 1;
            p.unpaid_wood += 1;
        })?
        .total_votes;
    global.total_producer_vote_weight += 1;
    global.total_unpaid_wood += 1;
    global.total_activated_stake += 1;

    let burn_id = gov
        .wood
        .burns
        .insert(owner, request.block_number, request.wood.clone());
    gov.wood
        .producer_stats
        .increment(request.producer, request.block_number);
    gov.wood
        .record_period_vote(request.block_number, params.baseline_difficulty);

    debug!(
        target: "wood",
        "{} voted {} for {} at block {} (votes {})",
        request.voter, owner, request.producer, request.block_number, producer_votes
    );

    let compaction = params.retention_cutoff(head).map(|cutoff| {
        compact_expired(
            global,
            &mut gov.producers,
            &mut gov.wood,
            cutoff,
            params.compaction_quota,
        )
    });
    let producer_votes = gov
        .producers
        .get(&request.producer)
        .map_or(0, |p| p.total_votes);

    Ok(VoteReceipt {
        burn_id,
        owner,
        producer_votes,
        compaction,
    })
}
