//! Decoding governance objects from the daemon's object listing.
//!
//! The daemon publishes each object as hex-encoded JSON. Two encodings are in
//! circulation:
//!
//! - a plain JSON object carrying a numeric `type` field
//! - the legacy `[["proposal" | "trigger", { ... }]]` wrapper
//!
//! Superblock lists (`payment_addresses`, `payment_amounts`,
//! `proposal_hashes`) are `|`-delimited strings. They are split here but not
//! cross-checked; mismatched lengths are a validity concern.

use serde::Deserialize;
use serde_json::Value;

use sentinel_store::{
    GovernanceKind, GovernanceObject, Proposal, Superblock, OBJECT_TYPE_PROPOSAL,
    OBJECT_TYPE_TRIGGER,
};
use sentinel_types::{Amount, ObjectHash, Timestamp};

use crate::GovernanceError;

/// One entry of `gobject list`, as reported by the daemon.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ObjectEnvelope {
    #[serde(rename = "Hash")]
    pub hash: ObjectHash,
    #[serde(rename = "CollateralHash", default)]
    pub collateral_hash: ObjectHash,
    #[serde(rename = "ObjectType")]
    pub object_type: u32,
    #[serde(rename = "DataHex")]
    pub data_hex: String,
    #[serde(rename = "AbsoluteYesCount", default)]
    pub absolute_yes_count: i64,
    #[serde(rename = "YesCount", default)]
    pub yes_count: u64,
    #[serde(rename = "NoCount", default)]
    pub no_count: u64,
    #[serde(rename = "AbstainCount", default)]
    pub abstain_count: u64,
    #[serde(rename = "CreationTime", default)]
    pub creation_time: u64,
}

/// Numbers show up as integers, floats or strings depending on who built the
/// payload.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Numeric {
    Int(u64),
    Float(f64),
    Text(String),
}

impl Numeric {
    fn as_u64(&self) -> Option<u64> {
        match self {
            Numeric::Int(n) => Some(*n),
            Numeric::Float(f) if f.is_finite() && *f >= 0.0 && f.fract() == 0.0 => {
                Some(*f as u64)
            }
            Numeric::Float(_) => None,
            Numeric::Text(s) => s.trim().parse().ok(),
        }
    }

    fn as_amount(&self) -> Option<Amount> {
        match self {
            Numeric::Int(n) => Some(Amount::from_coins(*n)),
            Numeric::Float(f) => Amount::from_coins_f64(*f).ok(),
            Numeric::Text(s) => Amount::parse_decimal(s).ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawProposal {
    name: String,
    #[serde(default)]
    url: String,
    start_epoch: Numeric,
    end_epoch: Numeric,
    payment_address: String,
    payment_amount: Numeric,
}

#[derive(Debug, Deserialize)]
struct RawTrigger {
    event_block_height: Numeric,
    #[serde(default)]
    payment_addresses: String,
    #[serde(default)]
    payment_amounts: String,
    #[serde(default)]
    proposal_hashes: String,
}

/// Parse one listing entry into a cacheable object, stamped with `now` as its
/// last-synced time.
pub fn parse_object(
    envelope: &ObjectEnvelope,
    now: Timestamp,
) -> Result<GovernanceObject, GovernanceError> {
    let malformed = |reason: String| GovernanceError::Malformed {
        hash: envelope.hash.to_hex(),
        reason,
    };

    if envelope.object_type != OBJECT_TYPE_PROPOSAL && envelope.object_type != OBJECT_TYPE_TRIGGER
    {
        return Err(GovernanceError::UnsupportedType(envelope.object_type));
    }

    let document = decode_document(&envelope.data_hex).map_err(malformed)?;
    let kind = match envelope.object_type {
        OBJECT_TYPE_PROPOSAL => {
            GovernanceKind::Proposal(proposal_from(document).map_err(malformed)?)
        }
        _ => GovernanceKind::Superblock(superblock_from(document).map_err(malformed)?),
    };

    Ok(GovernanceObject {
        object_hash: envelope.hash,
        collateral_hash: envelope.collateral_hash,
        object_type: envelope.object_type,
        data_hex: envelope.data_hex.clone(),
        absolute_yes_count: envelope.absolute_yes_count,
        yes_count: envelope.yes_count,
        no_count: envelope.no_count,
        abstain_count: envelope.abstain_count,
        creation_time: Timestamp::new(envelope.creation_time),
        last_synced: now,
        kind,
    })
}

/// Hex → UTF-8 → JSON, unwrapping the legacy array form.
fn decode_document(data_hex: &str) -> Result<Value, String> {
    let bytes = hex::decode(data_hex.trim()).map_err(|e| format!("bad hex: {e}"))?;
    let text = String::from_utf8(bytes).map_err(|e| format!("bad utf-8: {e}"))?;
    let value: Value = serde_json::from_str(&text).map_err(|e| format!("bad json: {e}"))?;

    match value {
        Value::Object(_) => Ok(value),
        Value::Array(outer) => {
            let inner = outer
                .into_iter()
                .next()
                .ok_or_else(|| "empty legacy wrapper".to_string())?;
            match inner {
                Value::Array(pair) if pair.len() == 2 => pair
                    .into_iter()
                    .nth(1)
                    .filter(Value::is_object)
                    .ok_or_else(|| "legacy wrapper without body".to_string()),
                _ => Err("legacy wrapper is not a [name, body] pair".to_string()),
            }
        }
        _ => Err("payload is neither an object nor a legacy wrapper".to_string()),
    }
}

fn proposal_from(document: Value) -> Result<Proposal, String> {
    let raw: RawProposal = serde_json::from_value(document).map_err(|e| e.to_string())?;
    let start = raw
        .start_epoch
        .as_u64()
        .ok_or_else(|| "bad start_epoch".to_string())?;
    let end = raw
        .end_epoch
        .as_u64()
        .ok_or_else(|| "bad end_epoch".to_string())?;
    let amount = raw
        .payment_amount
        .as_amount()
        .ok_or_else(|| "bad payment_amount".to_string())?;

    Ok(Proposal {
        name: raw.name,
        url: raw.url,
        start_epoch: Timestamp::new(start),
        end_epoch: Timestamp::new(end),
        payment_address: raw.payment_address,
        payment_amount: amount,
    })
}

fn superblock_from(document: Value) -> Result<Superblock, String> {
    let raw: RawTrigger = serde_json::from_value(document).map_err(|e| e.to_string())?;
    let height = raw
        .event_block_height
        .as_u64()
        .ok_or_else(|| "bad event_block_height".to_string())?;

    let payment_amounts = split_list(&raw.payment_amounts)
        .into_iter()
        .map(|s| Amount::parse_decimal(s).map_err(|e| e.to_string()))
        .collect::<Result<Vec<_>, _>>()?;
    let proposal_hashes = split_list(&raw.proposal_hashes)
        .into_iter()
        .map(|s| ObjectHash::from_hex(s).map_err(|e| e.to_string()))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Superblock {
        event_block_height: height,
        payment_addresses: split_list(&raw.payment_addresses)
            .into_iter()
            .map(str::to_string)
            .collect(),
        payment_amounts,
        proposal_hashes,
    })
}

fn split_list(s: &str) -> Vec<&str> {
    if s.trim().is_empty() {
        return Vec::new();
    }
    s.split('|').map(str::trim).collect()
}
