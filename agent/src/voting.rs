//! Casting votes and the voting sweeps that use them.
//!
//! A vote is recorded locally only when the daemon accepted it, or when the
//! daemon refuses it as too frequent and its own vote listing shows this
//! agent already holds a vote on that signal.

use tracing::{debug, info, warn};

use sentinel_governance::policy::{expired_proposals, plan_vote, validity_outcome, VoteAction};
use sentinel_governance::validity::{check_object, ValidityContext};
use sentinel_rpc::{DaemonRpc, VoteResult};
use sentinel_store::{ObjectStore, VoteRecord, VoteStore};
use sentinel_types::{ObjectHash, Outpoint, Timestamp, VoteOutcome, VoteSignal};

use crate::AgentError;

/// What happened to one requested vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CastResult {
    /// This outcome was already recorded; nothing sent.
    AlreadyVoted,
    /// The daemon accepted the vote.
    Recorded,
    /// Rate limited, but the network already holds this agent's vote; that
    /// vote was recorded instead.
    AdoptedFromNetwork(VoteOutcome),
    /// Nothing recorded.
    NotRecorded,
}

impl CastResult {
    /// Whether this call left a new record in the local history.
    pub fn recorded(&self) -> bool {
        matches!(self, CastResult::Recorded | CastResult::AdoptedFromNetwork(_))
    }
}

/// Casts votes for one agent and keeps the local history in step.
pub struct Voter<'a, D, S: ?Sized> {
    daemon: &'a D,
    store: &'a S,
    agent: Outpoint,
    now: Timestamp,
}

impl<'a, D, S> Voter<'a, D, S>
where
    D: DaemonRpc,
    S: ObjectStore + VoteStore + ?Sized,
{
    pub fn new(daemon: &'a D, store: &'a S, agent: Outpoint, now: Timestamp) -> Self {
        Self {
            daemon,
            store,
            agent,
            now,
        }
    }

    pub fn agent(&self) -> &Outpoint {
        &self.agent
    }

    pub fn now(&self) -> Timestamp {
        self.now
    }

    pub fn existing(
        &self,
        object_hash: &ObjectHash,
        signal: VoteSignal,
    ) -> Result<Option<VoteRecord>, AgentError> {
        Ok(self.store.get_vote(object_hash, signal, &self.agent)?)
    }

    pub fn has_voted(&self, object_hash: &ObjectHash, signal: VoteSignal) -> Result<bool, AgentError> {
        Ok(self.existing(object_hash, signal)?.is_some())
    }

    /// Vote `signal`=`outcome` on an object unless that vote is already held.
    pub async fn cast(
        &self,
        object_hash: &ObjectHash,
        signal: VoteSignal,
        outcome: VoteOutcome,
    ) -> Result<CastResult, AgentError> {
        let existing = self.existing(object_hash, signal)?;
        match plan_vote(existing.as_ref(), outcome) {
            VoteAction::Skip => return Ok(CastResult::AlreadyVoted),
            VoteAction::Replace { previous } => {
                debug!(hash = %object_hash, %signal, %previous, %outcome, "superseding recorded vote");
            }
            VoteAction::Cast => {}
        }

        match self.daemon.vote(object_hash, signal, outcome).await? {
            VoteResult::Success => {
                info!(hash = %object_hash, %signal, %outcome, "vote cast");
                self.record(object_hash, signal, outcome, self.now)?;
                Ok(CastResult::Recorded)
            }
            VoteResult::TooOften => {
                let held = self
                    .daemon
                    .current_votes(object_hash, &self.agent)
                    .await?
                    .into_iter()
                    .find(|v| v.signal == signal && v.outpoint == self.agent);
                match held {
                    Some(vote) => {
                        info!(hash = %object_hash, %signal, outcome = %vote.outcome, "rate limited, adopting vote held on network");
                        self.record(object_hash, signal, vote.outcome, vote.time)?;
                        Ok(CastResult::AdoptedFromNetwork(vote.outcome))
                    }
                    None => {
                        warn!(hash = %object_hash, %signal, "rate limited and no vote on network");
                        Ok(CastResult::NotRecorded)
                    }
                }
            }
            VoteResult::Failed(reason) => {
                warn!(hash = %object_hash, %signal, %outcome, %reason, "vote failed");
                Ok(CastResult::NotRecorded)
            }
        }
    }

    fn record(
        &self,
        object_hash: &ObjectHash,
        signal: VoteSignal,
        outcome: VoteOutcome,
        cast_at: Timestamp,
    ) -> Result<(), AgentError> {
        self.store.put_vote(&VoteRecord {
            object_hash: *object_hash,
            signal,
            outcome,
            agent: self.agent.clone(),
            cast_at,
        })?;
        Ok(())
    }
}

/// Vote delete=yes on every proposal whose end lies more than `grace_secs`
/// in the past. Returns how many votes were recorded.
pub async fn prune_expired_proposals<D, S>(
    voter: &Voter<'_, D, S>,
    grace_secs: u64,
) -> Result<usize, AgentError>
where
    D: DaemonRpc,
    S: ObjectStore + VoteStore + ?Sized,
{
    let proposals = voter.store.proposals()?;
    let mut recorded = 0;
    for object in expired_proposals(&proposals, grace_secs, voter.now) {
        let result = voter
            .cast(&object.object_hash, VoteSignal::Delete, VoteOutcome::Yes)
            .await?;
        if result.recorded() {
            recorded += 1;
        }
    }
    debug!(recorded, "expired proposal sweep done");
    Ok(recorded)
}

/// Vote valid=yes/no on every tracked object this agent has not judged yet.
/// Returns how many votes were recorded.
pub async fn vote_validity<D, S>(
    voter: &Voter<'_, D, S>,
    ctx: &ValidityContext,
) -> Result<usize, AgentError>
where
    D: DaemonRpc,
    S: ObjectStore + VoteStore + ?Sized,
{
    let mut recorded = 0;
    for object in voter.store.iter_objects()? {
        if voter.has_voted(&object.object_hash, VoteSignal::Valid)? {
            continue;
        }
        let check = check_object(&object, ctx);
        if let Err(reason) = &check {
            debug!(hash = %object.object_hash, %reason, "object is invalid");
        }
        let result = voter
            .cast(&object.object_hash, VoteSignal::Valid, validity_outcome(&check))
            .await?;
        if result.recorded() {
            recorded += 1;
        }
    }
    Ok(recorded)
}
