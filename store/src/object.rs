//! Governance object storage trait.

use crate::StoreError;
use sentinel_types::{Amount, ObjectHash, Timestamp};
use serde::{Deserialize, Serialize};

/// Daemon object type tag for funding proposals.
pub const OBJECT_TYPE_PROPOSAL: u32 = 1;
/// Daemon object type tag for superblock triggers.
pub const OBJECT_TYPE_TRIGGER: u32 = 2;

/// A governance object as last reported by the daemon.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GovernanceObject {
    /// Stable identity of the object on the network.
    pub object_hash: ObjectHash,
    /// Fee transaction backing a proposal; zero for triggers.
    pub collateral_hash: ObjectHash,
    /// Raw daemon type tag (1 = proposal, 2 = trigger).
    pub object_type: u32,
    /// The payload exactly as published (hex of the JSON document).
    pub data_hex: String,
    /// Yes minus no funding votes across the network.
    pub absolute_yes_count: i64,
    pub yes_count: u64,
    pub no_count: u64,
    pub abstain_count: u64,
    pub creation_time: Timestamp,
    /// When this agent last saw the object in the daemon's listing.
    pub last_synced: Timestamp,
    pub kind: GovernanceKind,
}

/// Parsed payload, tagged by object type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GovernanceKind {
    Proposal(Proposal),
    Superblock(Superblock),
}

/// A funding proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub name: String,
    pub url: String,
    pub start_epoch: Timestamp,
    pub end_epoch: Timestamp,
    pub payment_address: String,
    pub payment_amount: Amount,
}

/// A superblock trigger: the payments to execute at `event_block_height`.
///
/// The three lists are parallel but kept as published; mismatched lengths
/// make the superblock invalid rather than unparseable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Superblock {
    pub event_block_height: u64,
    pub payment_addresses: Vec<String>,
    pub payment_amounts: Vec<Amount>,
    pub proposal_hashes: Vec<ObjectHash>,
}

impl Superblock {
    /// Total amount this superblock pays out, pinned at the largest
    /// representable amount on overflow.
    pub fn budget_allocation(&self) -> Amount {
        self.payment_amounts
            .iter()
            .fold(Amount::ZERO, |acc, a| acc.saturating_add(*a))
    }
}

impl GovernanceObject {
    pub fn as_proposal(&self) -> Option<&Proposal> {
        match &self.kind {
            GovernanceKind::Proposal(p) => Some(p),
            GovernanceKind::Superblock(_) => None,
        }
    }

    pub fn as_superblock(&self) -> Option<&Superblock> {
        match &self.kind {
            GovernanceKind::Superblock(sb) => Some(sb),
            GovernanceKind::Proposal(_) => None,
        }
    }

    /// Height this object is relevant to: the event height for superblocks.
    pub fn event_block_height(&self) -> Option<u64> {
        self.as_superblock().map(|sb| sb.event_block_height)
    }

    pub fn type_name(&self) -> &'static str {
        match self.kind {
            GovernanceKind::Proposal(_) => "proposal",
            GovernanceKind::Superblock(_) => "superblock",
        }
    }
}

/// Trait for the governance object cache.
pub trait ObjectStore {
    /// Insert or overwrite the object keyed by its hash.
    fn put_object(&self, object: &GovernanceObject) -> Result<(), StoreError>;

    fn get_object(&self, hash: &ObjectHash) -> Result<Option<GovernanceObject>, StoreError>;

    fn iter_objects(&self) -> Result<Vec<GovernanceObject>, StoreError>;

    fn object_count(&self) -> Result<u64, StoreError>;

    /// All cached proposals.
    fn proposals(&self) -> Result<Vec<GovernanceObject>, StoreError> {
        Ok(self
            .iter_objects()?
            .into_iter()
            .filter(|o| o.as_proposal().is_some())
            .collect())
    }

    /// All cached superblocks for one event height.
    fn superblocks_at_height(&self, height: u64) -> Result<Vec<GovernanceObject>, StoreError> {
        Ok(self
            .iter_objects()?
            .into_iter()
            .filter(|o| o.event_block_height() == Some(height))
            .collect())
    }

    /// Proposals whose absolute yes count strictly exceeds `quorum`.
    fn proposals_above_quorum(&self, quorum: i64) -> Result<Vec<GovernanceObject>, StoreError> {
        Ok(self
            .proposals()?
            .into_iter()
            .filter(|o| o.absolute_yes_count > quorum)
            .collect())
    }
}
