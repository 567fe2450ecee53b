//! The vote vocabulary shared with the daemon.
//!
//! Spellings are cross-validated by the network and must match exactly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypeError;

/// The category a vote applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VoteSignal {
    /// Pay (or do not pay) this object.
    Funding,
    /// The object is (in)valid.
    Valid,
    /// The object should be removed from the network.
    Delete,
    /// Endorsement by a trusted party.
    Endorsed,
}

impl VoteSignal {
    pub const ALL: [VoteSignal; 4] = [Self::Funding, Self::Valid, Self::Delete, Self::Endorsed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Funding => "funding",
            Self::Valid => "valid",
            Self::Delete => "delete",
            Self::Endorsed => "endorsed",
        }
    }

    /// Stable one-byte tag for storage keys.
    pub fn tag(&self) -> u8 {
        match self {
            Self::Funding => 1,
            Self::Valid => 2,
            Self::Delete => 3,
            Self::Endorsed => 4,
        }
    }
}

impl FromStr for VoteSignal {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "funding" => Ok(Self::Funding),
            "valid" => Ok(Self::Valid),
            "delete" => Ok(Self::Delete),
            "endorsed" => Ok(Self::Endorsed),
            other => Err(TypeError::UnknownSignal(other.to_string())),
        }
    }
}

impl fmt::Display for VoteSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The direction of a vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteOutcome {
    Yes,
    No,
    Abstain,
}

impl VoteOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
            Self::Abstain => "abstain",
        }
    }
}

impl FromStr for VoteOutcome {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "yes" => Ok(Self::Yes),
            "no" => Ok(Self::No),
            "abstain" => Ok(Self::Abstain),
            other => Err(TypeError::UnknownOutcome(other.to_string())),
        }
    }
}

impl fmt::Display for VoteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
