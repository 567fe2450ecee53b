//! Nullable store: thread-safe in-memory storage for testing.

use sentinel_store::{
    GovernanceObject, MetaStore, ObjectStore, StoreError, VoteRecord, VoteStore,
};
use sentinel_types::{ObjectHash, Outpoint, VoteSignal};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

type VoteKey = (ObjectHash, u8, Outpoint);

/// An in-memory object, vote and metadata store for testing.
/// Thread-safe for use with tokio's multi-threaded runtime.
pub struct NullStore {
    objects: Mutex<HashMap<ObjectHash, GovernanceObject>>,
    votes: Mutex<BTreeMap<VoteKey, VoteRecord>>,
    meta: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl NullStore {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            votes: Mutex::new(BTreeMap::new()),
            meta: Mutex::new(BTreeMap::new()),
        }
    }

    /// Every vote record, ordered by object hash (for assertions).
    pub fn all_votes(&self) -> Vec<VoteRecord> {
        self.votes.lock().unwrap().values().cloned().collect()
    }
}

impl Default for NullStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for NullStore {
    fn put_object(&self, object: &GovernanceObject) -> Result<(), StoreError> {
        self.objects
            .lock()
            .unwrap()
            .insert(object.object_hash, object.clone());
        Ok(())
    }

    fn get_object(&self, hash: &ObjectHash) -> Result<Option<GovernanceObject>, StoreError> {
        Ok(self.objects.lock().unwrap().get(hash).cloned())
    }

    fn iter_objects(&self) -> Result<Vec<GovernanceObject>, StoreError> {
        let mut objects: Vec<_> = self.objects.lock().unwrap().values().cloned().collect();
        objects.sort_by_key(|o| o.object_hash);
        Ok(objects)
    }

    fn object_count(&self) -> Result<u64, StoreError> {
        Ok(self.objects.lock().unwrap().len() as u64)
    }
}

impl VoteStore for NullStore {
    fn put_vote(&self, record: &VoteRecord) -> Result<(), StoreError> {
        let key = (record.object_hash, record.signal.tag(), record.agent.clone());
        self.votes.lock().unwrap().insert(key, record.clone());
        Ok(())
    }

    fn get_vote(
        &self,
        object_hash: &ObjectHash,
        signal: VoteSignal,
        agent: &Outpoint,
    ) -> Result<Option<VoteRecord>, StoreError> {
        let key = (*object_hash, signal.tag(), agent.clone());
        Ok(self.votes.lock().unwrap().get(&key).cloned())
    }

    fn vote_count(&self) -> Result<u64, StoreError> {
        Ok(self.votes.lock().unwrap().len() as u64)
    }
}

impl MetaStore for NullStore {
    fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.meta
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.meta.lock().unwrap().get(key).cloned())
    }

    fn delete_meta(&self, key: &str) -> Result<(), StoreError> {
        self.meta.lock().unwrap().remove(key);
        Ok(())
    }

    fn meta_keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .meta
            .lock()
            .unwrap()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}
