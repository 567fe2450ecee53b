use thiserror::Error;

#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("malformed object {hash}: {reason}")]
    Malformed { hash: String, reason: String },

    #[error("unsupported object type {0}")]
    UnsupportedType(u32),

    #[error("no approved proposals to build a superblock from")]
    NoApprovedProposals,

    #[error("no approved proposal fits the superblock budget and payment window")]
    NoneFitBudget,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
