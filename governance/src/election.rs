//! Submitter election.
//!
//! Exactly one enabled masternode should submit a locally built superblock.
//! Every agent computes the same answer from the same inputs (event height,
//! masternode set, seed block hash), so no coordination is needed and anyone
//! can verify the choice by recomputing it.

use sentinel_crypto::{abs_distance, sha256, sha256_multi};
use sentinel_types::{ObjectHash, Outpoint};

/// Status string the daemon reports for masternodes in good standing.
pub const STATUS_ENABLED: &str = "ENABLED";

/// One row of the daemon's masternode list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MasternodeEntry {
    pub outpoint: Outpoint,
    pub status: String,
}

impl MasternodeEntry {
    pub fn new(outpoint: Outpoint, status: impl Into<String>) -> Self {
        Self {
            outpoint,
            status: status.into(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.status == STATUS_ENABLED
    }
}

/// The point in hash space the election is measured against.
pub fn election_target(seed: &ObjectHash, event_block_height: u64) -> [u8; 32] {
    sha256_multi(&[seed.as_bytes(), &event_block_height.to_be_bytes()])
}

fn score(outpoint: &Outpoint) -> [u8; 32] {
    sha256(outpoint.to_string().as_bytes())
}

/// The enabled masternode whose outpoint hash is closest to the target.
///
/// Ties on distance go to the smaller outpoint. Returns `None` when no
/// masternode is enabled.
pub fn elect_submitter<'a>(
    masternodes: &'a [MasternodeEntry],
    event_block_height: u64,
    seed: &ObjectHash,
) -> Option<&'a Outpoint> {
    let target = election_target(seed, event_block_height);
    masternodes
        .iter()
        .filter(|mn| mn.is_enabled())
        .map(|mn| (abs_distance(&score(&mn.outpoint), &target), &mn.outpoint))
        .min()
        .map(|(_, outpoint)| outpoint)
}
