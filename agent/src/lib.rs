//! The governance sentinel's run logic.
//!
//! [`Sentinel`] drives one pass against a [`DaemonRpc`](sentinel_rpc::DaemonRpc)
//! and a [`SentinelStore`](sentinel_store::SentinelStore):
//!
//! - [`reconcile`] mirrors the daemon's governance objects into the cache;
//! - [`voting`] casts and records votes, prunes expired proposals and
//!   optionally judges validity;
//! - [`arbiter`] agrees on the next superblock without any agent-to-agent
//!   messaging;
//! - [`lease`] and [`scheduler`] keep overlapping cron runs apart.

pub mod agent;
pub mod arbiter;
pub mod config;
pub mod error;
pub mod lease;
pub mod reconcile;
pub mod scheduler;
pub mod shutdown;
pub mod voting;

pub use agent::{PassReport, RunOutcome, RunSettings, Sentinel, Unavailable};
pub use arbiter::{attempt_superblock, ArbiterSettings, SuperblockOutcome};
pub use config::SentinelConfig;
pub use error::AgentError;
pub use lease::RunLease;
pub use reconcile::{sync, SyncReport};
pub use scheduler::Scheduler;
pub use shutdown::ShutdownController;
pub use voting::{CastResult, Voter};
