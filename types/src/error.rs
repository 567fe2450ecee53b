//! Errors raised while parsing wire-level values.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid object hash: {0}")]
    InvalidHash(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid outpoint: {0}")]
    InvalidOutpoint(String),

    #[error("unknown vote signal: {0}")]
    UnknownSignal(String),

    #[error("unknown vote outcome: {0}")]
    UnknownOutcome(String),

    #[error("unknown network: {0}")]
    UnknownNetwork(String),
}
