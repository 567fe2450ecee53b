//! LMDB storage backend for the governance sentinel.
//!
//! Implements all storage traits from `sentinel-store` using the `heed` LMDB bindings.
//! Each logical store maps to one LMDB database within a single environment.

pub mod environment;
pub mod error;
pub mod meta;
pub mod migration;
pub mod object;
pub mod vote;

pub use environment::LmdbStore;
pub use error::LmdbError;
