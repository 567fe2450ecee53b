//! Abstract storage traits for the governance sentinel.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The rest of the codebase depends only on the traits.

pub mod error;
pub mod meta;
pub mod object;
pub mod vote;

pub use error::StoreError;
pub use meta::MetaStore;
pub use object::{
    GovernanceKind, GovernanceObject, ObjectStore, Proposal, Superblock, OBJECT_TYPE_PROPOSAL,
    OBJECT_TYPE_TRIGGER,
};
pub use vote::{VoteRecord, VoteStore};

/// Everything the sentinel needs from a single backend.
pub trait SentinelStore: ObjectStore + VoteStore + MetaStore {}

impl<T: ObjectStore + VoteStore + MetaStore> SentinelStore for T {}
