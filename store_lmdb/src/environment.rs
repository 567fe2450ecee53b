//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::migration::Migrator;
use crate::LmdbError;

/// Default map size: governance caches are small, 256 MiB is generous.
pub const DEFAULT_MAP_SIZE: usize = 256 * 1024 * 1024;

const MAX_DBS: u32 = 3;

/// Wraps the LMDB environment and all database handles.
///
/// - `objects`: object hash → bincode `GovernanceObject`
/// - `votes`: object hash ‖ signal tag ‖ agent outpoint → bincode `VoteRecord`
/// - `meta`: utf-8 key → raw bytes
pub struct LmdbStore {
    pub(crate) env: Arc<Env>,
    pub(crate) objects_db: Database<Bytes, Bytes>,
    pub(crate) votes_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbStore {
    /// Open or create the store at `path` with the default map size.
    pub fn open(path: &Path) -> Result<Self, LmdbError> {
        Self::open_with_map_size(path, DEFAULT_MAP_SIZE)
    }

    /// Open or create the store at `path`, creating the directory if needed,
    /// and bring the schema up to date.
    pub fn open_with_map_size(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the sentinel opens each environment once per process and
        // cross-process access is serialized by the run lease.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let objects_db = env.create_database(&mut wtxn, Some("objects"))?;
        let votes_db = env.create_database(&mut wtxn, Some("votes"))?;
        let meta_db = env.create_database(&mut wtxn, Some("meta"))?;
        wtxn.commit()?;

        let store = Self {
            env: Arc::new(env),
            objects_db,
            votes_db,
            meta_db,
        };
        Migrator::run(&store)?;
        tracing::debug!(path = %path.display(), "opened LMDB store");
        Ok(store)
    }
}
