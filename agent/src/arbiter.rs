//! Superblock arbitration for the next superblock height.
//!
//! ```text
//! NOT_ELIGIBLE → AWAIT_MATURITY → EVALUATE_EXISTING
//!              → (RATIFY_WINNER | PROPOSE_NEW) → SUBMIT_IF_ELECTED → DONE
//! ```
//!
//! Agents never talk to each other. Each builds the same candidate from the
//! same inputs, ratifies the copy already on the network if there is one,
//! and otherwise lets the deterministically elected masternode submit it.

use tracing::{debug, info, warn};

use sentinel_governance::election::elect_submitter;
use sentinel_governance::policy::{find_deterministic_match, funding_quorum};
use sentinel_governance::superblock::{build_candidate, rank_approved};
use sentinel_governance::validity::ValidityContext;
use sentinel_rpc::DaemonRpc;
use sentinel_store::{GovernanceObject, ObjectStore, VoteStore};
use sentinel_types::{NetworkId, ObjectHash, Outpoint, VoteOutcome, VoteSignal};

use crate::voting::{CastResult, Voter};
use crate::AgentError;

/// Chain parameters the arbiter needs beyond what the daemon reports.
#[derive(Clone, Copy, Debug)]
pub struct ArbiterSettings {
    pub network: NetworkId,
    pub maturity_phase_blocks: u64,
    pub block_spacing_secs: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SuperblockOutcome {
    /// This node is not a masternode.
    NotEligible,
    /// A funding=yes vote for this height already exists; competitors were
    /// voted down.
    RatifiedExisting { height: u64 },
    /// Too early to build a superblock.
    AwaitingMaturity { height: u64, current: u64 },
    /// No candidate could be built.
    ConstructionFailed { height: u64, reason: String },
    /// The network already carries our candidate; funding=yes on it.
    RatifiedCandidate { height: u64, winner: ObjectHash },
    /// The network carries our candidate but funding=yes on it was not
    /// recorded. Competitors are left alone until the next pass.
    RatificationPending { height: u64, winner: ObjectHash },
    /// This agent was elected and submitted the candidate.
    Submitted { height: u64, object_hash: ObjectHash },
    /// Another masternode is expected to submit.
    AwaitingSubmitter {
        height: u64,
        elected: Option<Outpoint>,
    },
}

fn holds_funding_yes<D, S>(
    voter: &Voter<'_, D, S>,
    superblocks: &[GovernanceObject],
) -> Result<bool, AgentError>
where
    D: DaemonRpc,
    S: ObjectStore + VoteStore + ?Sized,
{
    for sb in superblocks {
        if let Some(record) = voter.existing(&sb.object_hash, VoteSignal::Funding)? {
            if record.outcome == VoteOutcome::Yes {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// Cast `signal`=`outcome` on every superblock lacking a funding record.
async fn vote_unfunded<D, S>(
    voter: &Voter<'_, D, S>,
    superblocks: &[GovernanceObject],
    signal: VoteSignal,
    outcome: VoteOutcome,
) -> Result<(), AgentError>
where
    D: DaemonRpc,
    S: ObjectStore + VoteStore + ?Sized,
{
    for sb in superblocks {
        if voter.has_voted(&sb.object_hash, VoteSignal::Funding)? {
            continue;
        }
        voter.cast(&sb.object_hash, signal, outcome).await?;
    }
    Ok(())
}

/// Run the arbitration once for the daemon's next superblock height.
///
/// `voter` is `None` when this node is not a masternode.
pub async fn attempt_superblock<D, S>(
    daemon: &D,
    store: &S,
    voter: Option<&Voter<'_, D, S>>,
    settings: &ArbiterSettings,
) -> Result<SuperblockOutcome, AgentError>
where
    D: DaemonRpc,
    S: ObjectStore + VoteStore + ?Sized,
{
    let Some(voter) = voter else {
        info!("not a masternode, cannot arbitrate superblocks");
        return Ok(SuperblockOutcome::NotEligible);
    };

    let info = daemon.governance_info().await?;
    let height = info.next_superblock;
    let superblocks = store.superblocks_at_height(height)?;

    if holds_funding_yes(voter, &superblocks)? {
        debug!(height, "already voted funding for this height");
        vote_unfunded(voter, &superblocks, VoteSignal::Funding, VoteOutcome::No).await?;
        return Ok(SuperblockOutcome::RatifiedExisting { height });
    }

    let current = daemon.block_count().await?;
    if current < height.saturating_sub(settings.maturity_phase_blocks) {
        debug!(height, current, "not in maturity phase yet");
        return Ok(SuperblockOutcome::AwaitingMaturity { height, current });
    }

    let enabled = daemon.enabled_masternode_count().await?;
    let quorum = funding_quorum(info.min_quorum, enabled);
    let budget = daemon.superblock_budget(height).await?;
    let ctx = ValidityContext {
        network: settings.network,
        max_budget: budget,
        max_data_size: info.max_data_size,
    };
    let proposals = store.proposals_above_quorum(quorum)?;
    let ranked = rank_approved(&proposals, quorum, &ctx);
    let sb_epoch = daemon
        .block_height_to_epoch(height, voter.now(), settings.block_spacing_secs)
        .await?;

    let candidate = match build_candidate(&ranked, height, budget, sb_epoch) {
        Ok(candidate) => candidate,
        Err(e) => {
            warn!(height, error = %e, "no superblock built");
            return Ok(SuperblockOutcome::ConstructionFailed {
                height,
                reason: e.to_string(),
            });
        }
    };
    debug!(height, sb_hash = %candidate.sb_hash, payments = candidate.superblock.payment_amounts.len(), "candidate built");

    if let Some(winner) = find_deterministic_match(&superblocks, &candidate.sb_hash) {
        let winner = winner.object_hash;
        let funded = voter
            .cast(&winner, VoteSignal::Funding, VoteOutcome::Yes)
            .await?;
        if !matches!(
            funded,
            CastResult::Recorded
                | CastResult::AlreadyVoted
                | CastResult::AdoptedFromNetwork(VoteOutcome::Yes)
        ) {
            warn!(height, %winner, result = ?funded, "funding vote on deterministic superblock not held");
            return Ok(SuperblockOutcome::RatificationPending { height, winner });
        }
        let others: Vec<GovernanceObject> = superblocks
            .into_iter()
            .filter(|sb| sb.object_hash != winner)
            .collect();
        vote_unfunded(voter, &others, VoteSignal::Delete, VoteOutcome::Yes).await?;
        info!(height, %winner, "ratified deterministic superblock");
        return Ok(SuperblockOutcome::RatifiedCandidate { height, winner });
    }
    debug!(height, "candidate not found on the network");

    let masternodes = daemon.masternode_list().await?;
    let seed = daemon.block_hash(current).await?;
    let elected = elect_submitter(&masternodes, height, &seed).cloned();
    if elected.as_ref() != Some(voter.agent()) {
        debug!(height, elected = ?elected.as_ref().map(ToString::to_string), "not the elected submitter");
        return Ok(SuperblockOutcome::AwaitingSubmitter { height, elected });
    }

    let object_hash = daemon
        .submit_superblock(voter.now(), &candidate.data_hex)
        .await?;
    info!(height, %object_hash, "elected; superblock submitted");
    Ok(SuperblockOutcome::Submitted {
        height,
        object_hash,
    })
}
