//! Network identifier.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::TypeError;

/// Identifies which chain the masternode daemon is running on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkId {
    /// The production network.
    Mainnet,
    /// The public test network.
    Testnet,
}

impl NetworkId {
    /// Default daemon JSON-RPC port for this network.
    pub fn default_rpc_port(&self) -> u16 {
        match self {
            Self::Mainnet => 9998,
            Self::Testnet => 19998,
        }
    }

    /// Blocks before a superblock during which new objects are no longer
    /// admitted (roughly three days of blocks on mainnet).
    pub fn maturity_phase_blocks(&self) -> u64 {
        match self {
            Self::Mainnet => 1662,
            Self::Testnet => 24,
        }
    }

    /// Base58check version bytes accepted for payment addresses
    /// (pay-to-pubkey-hash, pay-to-script-hash).
    pub fn address_versions(&self) -> [u8; 2] {
        match self {
            Self::Mainnet => [76, 16],
            Self::Testnet => [140, 19],
        }
    }

    /// Human-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
        }
    }
}

impl FromStr for NetworkId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mainnet" | "main" | "live" => Ok(Self::Mainnet),
            "testnet" | "test" => Ok(Self::Testnet),
            other => Err(TypeError::UnknownNetwork(other.to_string())),
        }
    }
}
