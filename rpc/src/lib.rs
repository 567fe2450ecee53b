//! JSON-RPC client for the masternode daemon.
//!
//! Provides:
//! - [`DaemonRpc`]: the narrow set of queries and mutations the sentinel uses
//! - [`RpcClient`]: the reqwest-backed implementation
//! - Credentials read from the daemon's own configuration file
//! - Typed responses, including vote result classification

pub mod client;
pub mod config;
pub mod error;
pub mod responses;

pub use client::{DaemonRpc, RpcClient};
pub use config::{DaemonConfig, RpcCredentials};
pub use error::RpcError;
pub use responses::{GovernanceInfo, MasternodeStatus, NetworkVote, NodeInfo, VoteResult};
