//! Cryptographic primitives for the governance sentinel.
//!
//! - **SHA-256** for superblock content hashes and submitter election scores
//! - **Double SHA-256** for base58check checksums
//! - Payment address validation (base58check with per-network version bytes)
//! - 256-bit distance between hashes for deterministic election

pub mod address;
pub mod distance;
pub mod hash;

pub use address::{decode_base58check, validate_payment_address};
pub use distance::abs_distance;
pub use hash::{sha256, sha256_multi, sha256d};
