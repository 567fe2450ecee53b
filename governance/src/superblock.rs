//! Deterministic superblock construction.
//!
//! Every compliant agent ranks the same approved proposals the same way and
//! serializes the result byte-for-byte identically, so independent agents
//! arrive at the same `sb_hash` without talking to each other.

use serde::Serialize;
use tracing::debug;

use sentinel_crypto::sha256;
use sentinel_store::{GovernanceObject, Superblock, OBJECT_TYPE_TRIGGER};
use sentinel_types::{Amount, ObjectHash, Timestamp};

use crate::validity::{check_object, ValidityContext};
use crate::GovernanceError;

/// Tolerance around a proposal's payment window when matching it against the
/// superblock's estimated time.
pub const PAYMENT_WINDOW_FUDGE_SECS: u64 = 2 * 60 * 60;

/// A locally built superblock, ready to compare or submit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SuperblockCandidate {
    pub superblock: Superblock,
    /// Hex of the canonical payload, as submitted to the daemon.
    pub data_hex: String,
    pub sb_hash: ObjectHash,
}

/// Canonical payload. Field order is alphabetical so the compact JSON has
/// sorted keys.
#[derive(Serialize)]
struct TriggerPayload<'a> {
    event_block_height: u64,
    payment_addresses: &'a str,
    payment_amounts: &'a str,
    proposal_hashes: &'a str,
    #[serde(rename = "type")]
    object_type: u32,
}

/// Canonical JSON text for `sb`.
pub fn trigger_payload(sb: &Superblock) -> Result<String, GovernanceError> {
    let addresses = sb.payment_addresses.join("|");
    let amounts = sb
        .payment_amounts
        .iter()
        .map(Amount::to_string)
        .collect::<Vec<_>>()
        .join("|");
    let hashes = sb
        .proposal_hashes
        .iter()
        .map(ObjectHash::to_hex)
        .collect::<Vec<_>>()
        .join("|");
    let payload = TriggerPayload {
        event_block_height: sb.event_block_height,
        payment_addresses: &addresses,
        payment_amounts: &amounts,
        proposal_hashes: &hashes,
        object_type: OBJECT_TYPE_TRIGGER,
    };
    Ok(serde_json::to_string(&payload)?)
}

pub fn trigger_payload_hex(sb: &Superblock) -> Result<String, GovernanceError> {
    trigger_payload(sb).map(hex::encode)
}

/// Content hash of a superblock: SHA-256 over the hex payload text.
pub fn superblock_hash(sb: &Superblock) -> Result<ObjectHash, GovernanceError> {
    let payload_hex = trigger_payload_hex(sb)?;
    Ok(ObjectHash::new(sha256(payload_hex.as_bytes())))
}

/// Proposals eligible for payment, best first.
///
/// Keeps valid proposals with `absolute_yes_count > quorum`, ordered by
/// absolute yes count descending, then object hash descending.
pub fn rank_approved<'a>(
    objects: &'a [GovernanceObject],
    quorum: i64,
    ctx: &ValidityContext,
) -> Vec<&'a GovernanceObject> {
    let mut ranked: Vec<&GovernanceObject> = objects
        .iter()
        .filter(|o| o.as_proposal().is_some())
        .filter(|o| o.absolute_yes_count > quorum)
        .filter(|o| match check_object(o, ctx) {
            Ok(()) => true,
            Err(reason) => {
                debug!(hash = %o.object_hash, %reason, "approved proposal is invalid, not ranking");
                false
            }
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.absolute_yes_count
            .cmp(&a.absolute_yes_count)
            .then_with(|| b.object_hash.cmp(&a.object_hash))
    });
    ranked
}

fn in_payment_window(object: &GovernanceObject, sb_epoch: Timestamp) -> bool {
    let Some(p) = object.as_proposal() else {
        return false;
    };
    let opens = p.start_epoch.saturating_sub(PAYMENT_WINDOW_FUDGE_SECS);
    let closes = p.end_epoch.saturating_add(PAYMENT_WINDOW_FUDGE_SECS);
    opens <= sb_epoch && sb_epoch <= closes
}

/// Pack ranked proposals into a superblock for `event_block_height`.
///
/// Walks `ranked` in order, taking each proposal whose payment window covers
/// `sb_epoch` and whose amount still fits `budget`. Payments are then ordered
/// by proposal hash descending.
pub fn build_candidate(
    ranked: &[&GovernanceObject],
    event_block_height: u64,
    budget: Amount,
    sb_epoch: Timestamp,
) -> Result<SuperblockCandidate, GovernanceError> {
    if ranked.is_empty() {
        return Err(GovernanceError::NoApprovedProposals);
    }

    let mut remaining = budget;
    let mut selected: Vec<(ObjectHash, &str, Amount)> = Vec::new();
    for object in ranked {
        let Some(p) = object.as_proposal() else {
            continue;
        };
        if !in_payment_window(object, sb_epoch) {
            debug!(hash = %object.object_hash, "superblock time outside payment window");
            continue;
        }
        if p.payment_amount > remaining {
            debug!(hash = %object.object_hash, amount = %p.payment_amount, %remaining, "does not fit remaining budget");
            continue;
        }
        remaining = remaining.saturating_sub(p.payment_amount);
        selected.push((object.object_hash, &p.payment_address, p.payment_amount));
    }

    if selected.is_empty() {
        return Err(GovernanceError::NoneFitBudget);
    }
    selected.sort_by(|a, b| b.0.cmp(&a.0));

    let superblock = Superblock {
        event_block_height,
        payment_addresses: selected.iter().map(|s| s.1.to_string()).collect(),
        payment_amounts: selected.iter().map(|s| s.2).collect(),
        proposal_hashes: selected.iter().map(|s| s.0).collect(),
    };
    let data_hex = trigger_payload_hex(&superblock)?;
    let sb_hash = ObjectHash::new(sha256(data_hex.as_bytes()));

    Ok(SuperblockCandidate {
        superblock,
        data_hex,
        sb_hash,
    })
}
