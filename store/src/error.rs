use thiserror::Error;

/// Failures a storage backend reports to the sentinel.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not complete the read or write.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A stored object or vote record could not be encoded or decoded.
    #[error("cannot encode or decode stored record: {0}")]
    Serialization(String),
}
