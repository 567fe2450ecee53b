//! Voting policy decisions.
//!
//! Pure functions that answer "should this agent vote, and how" given the
//! local vote history and the current governance state.

use sentinel_store::{GovernanceObject, VoteRecord};
use sentinel_types::{ObjectHash, Timestamp, VoteOutcome};

use crate::superblock::superblock_hash;
use crate::validity::InvalidReason;

/// What to do about a desired `(signal, outcome)` on one object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoteAction {
    /// The agent already holds this outcome.
    Skip,
    /// No vote recorded yet.
    Cast,
    /// A different outcome is recorded; casting supersedes it.
    Replace { previous: VoteOutcome },
}

impl VoteAction {
    pub fn should_cast(&self) -> bool {
        !matches!(self, VoteAction::Skip)
    }
}

pub fn plan_vote(existing: Option<&VoteRecord>, desired: VoteOutcome) -> VoteAction {
    match existing {
        Some(record) if record.outcome == desired => VoteAction::Skip,
        Some(record) => VoteAction::Replace {
            previous: record.outcome,
        },
        None => VoteAction::Cast,
    }
}

/// Grace period after a proposal's end before it is considered expired:
/// one full superblock cycle.
pub fn expiry_grace_secs(superblock_cycle_blocks: u64, block_spacing_secs: u64) -> u64 {
    superblock_cycle_blocks.saturating_mul(block_spacing_secs)
}

/// `end_epoch + grace < now`. The boundary itself is not expired.
pub fn is_expired(object: &GovernanceObject, grace_secs: u64, now: Timestamp) -> bool {
    object
        .as_proposal()
        .is_some_and(|p| p.end_epoch.has_expired(grace_secs, now))
}

pub fn expired_proposals(
    objects: &[GovernanceObject],
    grace_secs: u64,
    now: Timestamp,
) -> Vec<&GovernanceObject> {
    objects
        .iter()
        .filter(|o| is_expired(o, grace_secs, now))
        .collect()
}

/// Minimum absolute yes count a proposal must exceed to be paid.
pub fn funding_quorum(min_quorum: i64, enabled_masternodes: u64) -> i64 {
    let tenth = i64::try_from(enabled_masternodes / 10).unwrap_or(i64::MAX);
    min_quorum.max(tenth)
}

/// Among `superblocks`, the one with the highest object hash whose content
/// hash equals `sb_hash`.
pub fn find_deterministic_match<'a>(
    superblocks: &'a [GovernanceObject],
    sb_hash: &ObjectHash,
) -> Option<&'a GovernanceObject> {
    superblocks
        .iter()
        .filter(|o| {
            o.as_superblock()
                .and_then(|sb| superblock_hash(sb).ok())
                .is_some_and(|h| h == *sb_hash)
        })
        .max_by_key(|o| o.object_hash)
}

pub fn validity_outcome(check: &Result<(), InvalidReason>) -> VoteOutcome {
    match check {
        Ok(()) => VoteOutcome::Yes,
        Err(_) => VoteOutcome::No,
    }
}
