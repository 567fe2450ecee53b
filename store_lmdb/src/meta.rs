//! LMDB implementation of MetaStore.

use sentinel_store::meta::MetaStore;
use sentinel_store::StoreError;

use crate::{LmdbError, LmdbStore};

const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";

impl MetaStore for LmdbStore {
    fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.meta_db
            .put(&mut wtxn, key.as_bytes(), value)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .meta_db
            .get(&rtxn, key.as_bytes())
            .map_err(LmdbError::from)?;
        Ok(val.map(|v| v.to_vec()))
    }

    fn delete_meta(&self, key: &str) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.meta_db
            .delete(&mut wtxn, key.as_bytes())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn meta_keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self
            .meta_db
            .prefix_iter(&rtxn, prefix.as_bytes())
            .map_err(LmdbError::from)?;
        let mut keys = Vec::new();
        for entry in iter {
            let (key, _) = entry.map_err(LmdbError::from)?;
            if let Ok(key) = std::str::from_utf8(key) {
                keys.push(key.to_string());
            }
        }
        Ok(keys)
    }
}

impl LmdbStore {
    /// The stored schema version; 0 for a fresh database.
    pub fn schema_version(&self) -> Result<u32, LmdbError> {
        let rtxn = self.env.read_txn()?;
        match self.meta_db.get(&rtxn, SCHEMA_VERSION_KEY)? {
            Some(bytes) => {
                let arr: [u8; 4] = bytes.try_into().map_err(|_| {
                    LmdbError::Serialization(
                        "schema_version has unexpected byte length".to_string(),
                    )
                })?;
                Ok(u32::from_le_bytes(arr))
            }
            None => Ok(0),
        }
    }

    pub fn set_schema_version(&self, version: u32) -> Result<(), LmdbError> {
        let mut wtxn = self.env.write_txn()?;
        self.meta_db
            .put(&mut wtxn, SCHEMA_VERSION_KEY, &version.to_le_bytes())?;
        wtxn.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_delete_meta() {
        let dir = tempfile::tempdir().unwrap();
        let store = LmdbStore::open(dir.path()).unwrap();

        assert_eq!(store.get_meta("k").unwrap(), None);
        store.put_meta("k", b"v1").unwrap();
        store.put_meta("k", b"v2").unwrap();
        assert_eq!(store.get_meta("k").unwrap().as_deref(), Some(&b"v2"[..]));
        store.delete_meta("k").unwrap();
        assert_eq!(store.get_meta("k").unwrap(), None);
        store.delete_meta("k").unwrap();
    }

    #[test]
    fn prefix_listing() {
        let dir = tempfile::tempdir().unwrap();
        let store = LmdbStore::open(dir.path()).unwrap();
        store.put_meta("__transient_A", b"1").unwrap();
        store.put_meta("__transient_B", b"2").unwrap();
        store.put_meta("other", b"3").unwrap();

        let mut keys = store.meta_keys_with_prefix("__transient_").unwrap();
        keys.sort();
        assert_eq!(keys, ["__transient_A", "__transient_B"]);
    }
}
