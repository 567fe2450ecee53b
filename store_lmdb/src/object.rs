//! LMDB implementation of ObjectStore.

use sentinel_store::object::{GovernanceObject, ObjectStore};
use sentinel_store::StoreError;
use sentinel_types::ObjectHash;

use crate::{LmdbError, LmdbStore};

impl ObjectStore for LmdbStore {
    fn put_object(&self, object: &GovernanceObject) -> Result<(), StoreError> {
        let bytes = bincode::serialize(object).map_err(LmdbError::from)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.objects_db
            .put(&mut wtxn, object.object_hash.as_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_object(&self, hash: &ObjectHash) -> Result<Option<GovernanceObject>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .objects_db
            .get(&rtxn, hash.as_bytes())
            .map_err(LmdbError::from)?;
        match val {
            Some(bytes) => {
                let object: GovernanceObject =
                    bincode::deserialize(bytes).map_err(LmdbError::from)?;
                Ok(Some(object))
            }
            None => Ok(None),
        }
    }

    fn iter_objects(&self) -> Result<Vec<GovernanceObject>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self.objects_db.iter(&rtxn).map_err(LmdbError::from)?;
        let mut objects = Vec::new();
        for entry in iter {
            let (_key, val) = entry.map_err(LmdbError::from)?;
            let object: GovernanceObject = bincode::deserialize(val).map_err(LmdbError::from)?;
            objects.push(object);
        }
        Ok(objects)
    }

    fn object_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let count = self.objects_db.len(&rtxn).map_err(LmdbError::from)?;
        Ok(count)
    }
}
