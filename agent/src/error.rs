use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("daemon RPC error: {0}")]
    Rpc(#[from] sentinel_rpc::RpcError),

    #[error("store error: {0}")]
    Store(#[from] sentinel_store::StoreError),

    #[error("governance error: {0}")]
    Governance(#[from] sentinel_governance::GovernanceError),

    #[error("another sentinel instance holds the run lease")]
    LeaseHeld,

    #[error("pass interrupted by shutdown signal")]
    Interrupted,

    #[error("corrupt transient flag {key}: {reason}")]
    CorruptFlag { key: String, reason: String },

    #[error("config error: {0}")]
    Config(String),
}
