//! Time-limited flags in the metadata store, and the run lease built on them.
//!
//! A flag lives under `__transient_<NAME>` as JSON
//! `{"value": .., "created_at": .., "timeout": ..}`. Once
//! `created_at + timeout` has passed the flag reads as absent and is removed.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use sentinel_store::MetaStore;
use sentinel_types::Timestamp;

use crate::AgentError;

pub const TRANSIENT_PREFIX: &str = "__transient_";

/// Name of the flag marking a sentinel run in progress.
pub const LEASE_NAME: &str = "SENTINEL_RUNNING";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransientFlag {
    pub value: u64,
    pub created_at: u64,
    pub timeout: u64,
}

impl TransientFlag {
    pub fn is_expired(&self, now: Timestamp) -> bool {
        Timestamp::new(self.created_at).has_expired(self.timeout, now)
    }
}

fn key(name: &str) -> String {
    format!("{TRANSIENT_PREFIX}{name}")
}

/// Read a flag. Expired or unreadable entries are deleted and read as `None`.
pub fn get_transient<S: MetaStore + ?Sized>(
    store: &S,
    name: &str,
    now: Timestamp,
) -> Result<Option<TransientFlag>, AgentError> {
    let key = key(name);
    let Some(bytes) = store.get_meta(&key)? else {
        return Ok(None);
    };
    match serde_json::from_slice::<TransientFlag>(&bytes) {
        Ok(flag) if flag.is_expired(now) => {
            debug!(%key, "transient flag expired");
            store.delete_meta(&key)?;
            Ok(None)
        }
        Ok(flag) => Ok(Some(flag)),
        Err(e) => {
            warn!(%key, error = %e, "discarding unreadable transient flag");
            store.delete_meta(&key)?;
            Ok(None)
        }
    }
}

pub fn set_transient<S: MetaStore + ?Sized>(
    store: &S,
    name: &str,
    value: u64,
    now: Timestamp,
    timeout_secs: u64,
) -> Result<(), AgentError> {
    let flag = TransientFlag {
        value,
        created_at: now.as_secs(),
        timeout: timeout_secs,
    };
    let bytes = serde_json::to_vec(&flag).map_err(|e| AgentError::CorruptFlag {
        key: key(name),
        reason: e.to_string(),
    })?;
    store.put_meta(&key(name), &bytes)?;
    Ok(())
}

pub fn delete_transient<S: MetaStore + ?Sized>(store: &S, name: &str) -> Result<(), AgentError> {
    store.delete_meta(&key(name))?;
    Ok(())
}

/// Exclusive right to run a pass, held until dropped.
///
/// The TTL only matters if the holder dies without dropping the lease; a
/// normal exit, an error, or a cancelled pass all release it.
pub struct RunLease<'a, S: MetaStore + ?Sized> {
    store: &'a S,
    released: bool,
}

impl<'a, S: MetaStore + ?Sized> RunLease<'a, S> {
    /// Take the lease, or fail with [`AgentError::LeaseHeld`] if another
    /// instance holds an unexpired one.
    pub fn acquire(store: &'a S, now: Timestamp, ttl_secs: u64) -> Result<Self, AgentError> {
        if get_transient(store, LEASE_NAME, now)?.is_some() {
            return Err(AgentError::LeaseHeld);
        }
        set_transient(store, LEASE_NAME, now.as_secs(), now, ttl_secs)?;
        debug!(ttl_secs, "run lease acquired");
        Ok(Self {
            store,
            released: false,
        })
    }

    pub fn release(mut self) -> Result<(), AgentError> {
        self.released = true;
        delete_transient(self.store, LEASE_NAME)
    }
}

impl<S: MetaStore + ?Sized> Drop for RunLease<'_, S> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match delete_transient(self.store, LEASE_NAME) {
            Ok(()) => debug!("run lease released"),
            Err(e) => warn!(error = %e, "failed to release run lease"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_nullables::NullStore;

    #[test]
    fn flag_expires_after_timeout() {
        let store = NullStore::new();
        set_transient(&store, "X", 7, Timestamp::new(100), 90).unwrap();
        assert_eq!(
            get_transient(&store, "X", Timestamp::new(190)).unwrap().map(|f| f.value),
            Some(7)
        );
        assert_eq!(get_transient(&store, "X", Timestamp::new(191)).unwrap(), None);
        assert_eq!(store.get_meta("__transient_X").unwrap(), None);
    }

    #[test]
    fn garbage_reads_as_absent() {
        let store = NullStore::new();
        store.put_meta("__transient_X", b"not json").unwrap();
        assert_eq!(get_transient(&store, "X", Timestamp::new(1)).unwrap(), None);
    }

    #[test]
    fn stored_as_json() {
        let store = NullStore::new();
        set_transient(&store, "X", 5, Timestamp::new(10), 90).unwrap();
        let raw = store.get_meta("__transient_X").unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(json["value"], 5);
        assert_eq!(json["created_at"], 10);
        assert_eq!(json["timeout"], 90);
    }

    #[test]
    fn lease_is_exclusive_until_dropped() {
        let store = NullStore::new();
        let lease = RunLease::acquire(&store, Timestamp::new(1_000), 90).unwrap();
        assert!(matches!(
            RunLease::acquire(&store, Timestamp::new(1_010), 90),
            Err(AgentError::LeaseHeld)
        ));
        drop(lease);
        assert!(RunLease::acquire(&store, Timestamp::new(1_010), 90).is_ok());
    }

    #[test]
    fn stale_lease_can_be_taken_over() {
        let store = NullStore::new();
        let stale = RunLease::acquire(&store, Timestamp::new(1_000), 90).unwrap();
        std::mem::forget(stale);
        assert!(RunLease::acquire(&store, Timestamp::new(1_050), 90).is_err());
        assert!(RunLease::acquire(&store, Timestamp::new(1_091), 90).is_ok());
    }

    #[test]
    fn explicit_release() {
        let store = NullStore::new();
        let lease = RunLease::acquire(&store, Timestamp::new(1), 90).unwrap();
        lease.release().unwrap();
        assert_eq!(store.get_meta("__transient_SENTINEL_RUNNING").unwrap(), None);
    }
}
