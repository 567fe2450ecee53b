//! Fundamental types for the governance sentinel.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! object hashes, coin amounts, timestamps, network identifiers, masternode
//! outpoints and the vote vocabulary understood by the daemon.

pub mod amount;
pub mod error;
pub mod hash;
pub mod network;
pub mod outpoint;
pub mod time;
pub mod vote;

pub use amount::Amount;
pub use error::TypeError;
pub use hash::ObjectHash;
pub use network::NetworkId;
pub use outpoint::Outpoint;
pub use time::{Clock, SystemClock, Timestamp};
pub use vote::{VoteOutcome, VoteSignal};
