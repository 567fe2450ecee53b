//! LMDB implementation of VoteStore.
//!
//! Key format: `object_hash (32) ++ signal tag (1) ++ agent outpoint (36)`.

use sentinel_store::vote::{VoteRecord, VoteStore};
use sentinel_store::StoreError;
use sentinel_types::{ObjectHash, Outpoint, VoteSignal};

use crate::{LmdbError, LmdbStore};

/// Build the binary composite key for one vote record.
fn vote_key(object_hash: &ObjectHash, signal: VoteSignal, agent: &Outpoint) -> Vec<u8> {
    let mut key = Vec::with_capacity(32 + 1 + 36);
    key.extend_from_slice(object_hash.as_bytes());
    key.push(signal.tag());
    key.extend_from_slice(&agent.to_key_bytes());
    key
}

impl VoteStore for LmdbStore {
    fn put_vote(&self, record: &VoteRecord) -> Result<(), StoreError> {
        let key = vote_key(&record.object_hash, record.signal, &record.agent);
        let bytes = bincode::serialize(record).map_err(LmdbError::from)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.votes_db
            .put(&mut wtxn, &key, &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_vote(
        &self,
        object_hash: &ObjectHash,
        signal: VoteSignal,
        agent: &Outpoint,
    ) -> Result<Option<VoteRecord>, StoreError> {
        let key = vote_key(object_hash, signal, agent);
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self.votes_db.get(&rtxn, &key).map_err(LmdbError::from)?;
        match val {
            Some(bytes) => {
                let record: VoteRecord = bincode::deserialize(bytes).map_err(LmdbError::from)?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    fn vote_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let count = self.votes_db.len(&rtxn).map_err(LmdbError::from)?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_types::{Timestamp, VoteOutcome};

    fn agent(index: u32) -> Outpoint {
        Outpoint::new(ObjectHash::new([0xaa; 32]), index)
    }

    fn record(obj: u8, signal: VoteSignal, outcome: VoteOutcome, who: u32) -> VoteRecord {
        VoteRecord {
            object_hash: ObjectHash::new([obj; 32]),
            signal,
            outcome,
            agent: agent(who),
            cast_at: Timestamp::new(1_000),
        }
    }

    #[test]
    fn composite_key_replaces_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let store = LmdbStore::open(dir.path()).unwrap();

        store
            .put_vote(&record(1, VoteSignal::Funding, VoteOutcome::No, 0))
            .unwrap();
        store
            .put_vote(&record(1, VoteSignal::Funding, VoteOutcome::Yes, 0))
            .unwrap();

        assert_eq!(store.vote_count().unwrap(), 1);
        let got = store
            .get_vote(&ObjectHash::new([1; 32]), VoteSignal::Funding, &agent(0))
            .unwrap()
            .unwrap();
        assert_eq!(got.outcome, VoteOutcome::Yes);
    }

    #[test]
    fn signals_and_agents_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let store = LmdbStore::open(dir.path()).unwrap();

        store
            .put_vote(&record(1, VoteSignal::Funding, VoteOutcome::Yes, 0))
            .unwrap();
        store
            .put_vote(&record(1, VoteSignal::Delete, VoteOutcome::Yes, 0))
            .unwrap();
        store
            .put_vote(&record(1, VoteSignal::Funding, VoteOutcome::No, 1))
            .unwrap();
        store
            .put_vote(&record(2, VoteSignal::Funding, VoteOutcome::Yes, 0))
            .unwrap();

        assert_eq!(store.vote_count().unwrap(), 4);
        assert!(store
            .has_voted(&ObjectHash::new([1; 32]), VoteSignal::Funding, &agent(1))
            .unwrap());
        assert!(store
            .has_voted(&ObjectHash::new([1; 32]), VoteSignal::Delete, &agent(0))
            .unwrap());
        assert!(!store
            .has_voted(&ObjectHash::new([1; 32]), VoteSignal::Valid, &agent(0))
            .unwrap());
    }

    #[test]
    fn records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = LmdbStore::open(dir.path()).unwrap();
            store
                .put_vote(&record(7, VoteSignal::Delete, VoteOutcome::Yes, 3))
                .unwrap();
        }
        let store = LmdbStore::open(dir.path()).unwrap();
        assert!(store
            .has_voted(&ObjectHash::new([7; 32]), VoteSignal::Delete, &agent(3))
            .unwrap());
    }
}
