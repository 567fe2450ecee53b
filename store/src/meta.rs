//! Metadata storage trait.

use crate::StoreError;

/// Trait for storing process metadata (transient flags, schedule, schema version).
///
/// This is a generic key-value store for internal bookkeeping that doesn't
/// belong with the governance objects.
pub trait MetaStore {
    /// Store a metadata value, replacing any previous value.
    fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Retrieve a metadata value.
    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Delete a metadata entry. Deleting a missing key is not an error.
    fn delete_meta(&self, key: &str) -> Result<(), StoreError>;

    /// List every key starting with `prefix`.
    fn meta_keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}
