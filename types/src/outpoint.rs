//! Masternode collateral outpoints.
//!
//! The outpoint uniquely identifies a masternode and doubles as the local
//! agent identity on vote records.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{ObjectHash, TypeError};

/// A collateral transaction output, `txid-index`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Outpoint {
    pub txid: ObjectHash,
    pub index: u32,
}

impl Outpoint {
    pub fn new(txid: ObjectHash, index: u32) -> Self {
        Self { txid, index }
    }

    /// Canonical byte form used in storage keys: txid followed by the index
    /// in big-endian.
    pub fn to_key_bytes(&self) -> [u8; 36] {
        let mut out = [0u8; 36];
        out[..32].copy_from_slice(self.txid.as_bytes());
        out[32..].copy_from_slice(&self.index.to_be_bytes());
        out
    }
}

/// Accepts `txid-index`, `txid:index` and the verbose
/// `COutPoint(txid, index)` rendering older daemons print.
impl FromStr for Outpoint {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TypeError::InvalidOutpoint(s.to_string());
        let trimmed = s.trim();
        let body = trimmed
            .strip_prefix("COutPoint(")
            .and_then(|rest| rest.strip_suffix(')'))
            .unwrap_or(trimmed);
        let (txid, index) = body
            .split_once(['-', ':', ','])
            .ok_or_else(invalid)?;
        let txid = ObjectHash::from_hex(txid.trim()).map_err(|_| invalid())?;
        let index = index.trim().parse::<u32>().map_err(|_| invalid())?;
        Ok(Self { txid, index })
    }
}

impl fmt::Display for Outpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.txid, self.index)
    }
}
