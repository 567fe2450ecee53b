//! Vote record storage trait.

use crate::StoreError;
use sentinel_types::{ObjectHash, Outpoint, Timestamp, VoteOutcome, VoteSignal};
use serde::{Deserialize, Serialize};

/// A vote this agent holds on the network.
///
/// `(object_hash, signal, agent)` is unique: writing a record with the same
/// triple replaces the previous outcome.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub object_hash: ObjectHash,
    pub signal: VoteSignal,
    pub outcome: VoteOutcome,
    /// Collateral outpoint of the masternode that cast the vote.
    pub agent: Outpoint,
    pub cast_at: Timestamp,
}

/// Trait for the local vote history.
pub trait VoteStore {
    /// Insert or replace the record for `(object_hash, signal, agent)`.
    fn put_vote(&self, record: &VoteRecord) -> Result<(), StoreError>;

    /// The current record for `(object_hash, signal, agent)`, if any.
    fn get_vote(
        &self,
        object_hash: &ObjectHash,
        signal: VoteSignal,
        agent: &Outpoint,
    ) -> Result<Option<VoteRecord>, StoreError>;

    fn vote_count(&self) -> Result<u64, StoreError>;

    /// Whether `agent` holds any outcome for `signal` on this object.
    fn has_voted(
        &self,
        object_hash: &ObjectHash,
        signal: VoteSignal,
        agent: &Outpoint,
    ) -> Result<bool, StoreError> {
        self.get_vote(object_hash, signal, agent).map(|v| v.is_some())
    }
}
