//! Mirroring the daemon's governance objects into the local cache.

use tracing::{debug, info, warn};

use sentinel_governance::{parse_object, GovernanceError};
use sentinel_rpc::DaemonRpc;
use sentinel_store::ObjectStore;
use sentinel_types::Timestamp;

use crate::AgentError;

/// Counts from one sync.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub fetched: usize,
    pub upserted: usize,
    pub skipped_malformed: usize,
    pub skipped_unsupported: usize,
}

/// Fetch the object listing once and upsert every parseable object.
///
/// Malformed payloads and unknown object types are counted and skipped.
/// Objects missing from the listing stay in the cache. An RPC failure aborts
/// the sync; objects already written stay written.
pub async fn sync<D, S>(daemon: &D, store: &S, now: Timestamp) -> Result<SyncReport, AgentError>
where
    D: DaemonRpc,
    S: ObjectStore + ?Sized,
{
    let listing = daemon.governance_objects().await?;
    let mut report = SyncReport {
        fetched: listing.len(),
        ..SyncReport::default()
    };

    for envelope in &listing {
        match parse_object(envelope, now) {
            Ok(object) => {
                store.put_object(&object)?;
                report.upserted += 1;
            }
            Err(GovernanceError::UnsupportedType(t)) => {
                debug!(hash = %envelope.hash, object_type = t, "skipping unsupported object type");
                report.skipped_unsupported += 1;
            }
            Err(e) => {
                warn!(hash = %envelope.hash, error = %e, "skipping malformed object");
                report.skipped_malformed += 1;
            }
        }
    }

    info!(
        fetched = report.fetched,
        upserted = report.upserted,
        malformed = report.skipped_malformed,
        unsupported = report.skipped_unsupported,
        "governance objects synced"
    );
    Ok(report)
}
