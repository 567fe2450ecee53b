//! RPC error types.
//!
//! Transport failures and errors reported by the daemon are both treated as
//! the daemon being unavailable; the variants keep them apart for logging.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("daemon returned HTTP {0}")]
    Http(u16),

    #[error("daemon error {code}: {message}")]
    Daemon { code: i64, message: String },

    #[error("invalid {method} response: {reason}")]
    InvalidResponse { method: String, reason: String },

    #[error("daemon config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RpcError {
    pub(crate) fn invalid(method: &str, reason: impl ToString) -> Self {
        RpcError::InvalidResponse {
            method: method.to_string(),
            reason: reason.to_string(),
        }
    }
}
