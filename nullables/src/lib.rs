//! Nullable infrastructure for deterministic testing.
//!
//! Inspired by the "A-frame architecture" pattern from RsNano.
//! Every external dependency of the sentinel (clock, daemon, storage) sits
//! behind a trait. This crate provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be scripted and inspected programmatically
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod daemon;
pub mod store;

pub use clock::NullClock;
pub use daemon::{proposal_envelope, trigger_envelope, NullDaemon};
pub use store::NullStore;
