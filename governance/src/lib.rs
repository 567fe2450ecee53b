//! Governance decision logic for the sentinel.
//!
//! Everything in this crate is pure: it consumes facts reported by the daemon
//! and the local vote history, and produces decisions. Talking to the daemon
//! and writing to the store happens in `sentinel-agent`.
//!
//! - [`parse`]: daemon object listing entries → [`GovernanceObject`]s
//! - [`validity`]: structural/semantic validity of proposals and superblocks
//! - [`superblock`]: ranking approved proposals and deterministically building
//!   a superblock candidate whose hash every compliant agent agrees on
//! - [`election`]: seed-derived choice of the agent that submits a candidate
//! - [`policy`]: vote-if-not-voted rules, expiry, and winner detection
//!
//! [`GovernanceObject`]: sentinel_store::GovernanceObject

pub mod election;
pub mod error;
pub mod parse;
pub mod policy;
pub mod superblock;
pub mod validity;

pub use election::{elect_submitter, MasternodeEntry};
pub use error::GovernanceError;
pub use parse::{parse_object, ObjectEnvelope};
pub use policy::{plan_vote, VoteAction};
pub use superblock::{build_candidate, rank_approved, superblock_hash, SuperblockCandidate};
pub use validity::{InvalidReason, ValidityContext};
