//! Structural and semantic validity of governance objects.
//!
//! A parsed object is not necessarily a sensible one. These checks decide the
//! `valid` vote and filter proposals before they can be packed into a
//! superblock.

use thiserror::Error;

use sentinel_crypto::validate_payment_address;
use sentinel_store::{GovernanceKind, GovernanceObject, Proposal, Superblock};
use sentinel_types::{Amount, NetworkId};

/// Payload size limit used when the daemon does not report one.
pub const DEFAULT_MAX_DATA_SIZE: usize = 512;

const MIN_URL_LEN: usize = 4;

/// Network facts the checks are evaluated against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValidityContext {
    pub network: NetworkId,
    /// Maximum budget of the next superblock.
    pub max_budget: Amount,
    /// Maximum payload size in bytes (the hex payload may be twice as long).
    pub max_data_size: usize,
}

impl ValidityContext {
    pub fn new(network: NetworkId, max_budget: Amount) -> Self {
        Self {
            network,
            max_budget,
            max_data_size: DEFAULT_MAX_DATA_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidReason {
    #[error("name is empty or contains characters outside [-_a-zA-Z0-9]")]
    BadName,

    #[error("end epoch {end} is not after start epoch {start}")]
    BadWindow { start: u64, end: u64 },

    #[error("payment amount is zero")]
    ZeroAmount,

    #[error("payment amount {amount} exceeds the superblock max budget {max}")]
    OverBudget { amount: Amount, max: Amount },

    #[error("invalid payment address {0}")]
    BadAddress(String),

    #[error("url is too short or contains whitespace")]
    BadUrl,

    #[error("payload is {size} hex chars, limit is {limit}")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("{addresses} addresses but {amounts} amounts")]
    LengthMismatch { addresses: usize, amounts: usize },

    #[error("{hashes} proposal hashes for {payments} payments")]
    ProposalHashMismatch { hashes: usize, payments: usize },

    #[error("superblock pays nothing")]
    EmptySuperblock,
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Check a proposal payload. `data_hex_len` is the length of the published
/// hex payload.
pub fn check_proposal(
    proposal: &Proposal,
    data_hex_len: usize,
    ctx: &ValidityContext,
) -> Result<(), InvalidReason> {
    if !is_valid_name(proposal.name.trim()) {
        return Err(InvalidReason::BadName);
    }
    if proposal.end_epoch <= proposal.start_epoch {
        return Err(InvalidReason::BadWindow {
            start: proposal.start_epoch.as_secs(),
            end: proposal.end_epoch.as_secs(),
        });
    }
    if proposal.payment_amount.is_zero() {
        return Err(InvalidReason::ZeroAmount);
    }
    if proposal.payment_amount > ctx.max_budget {
        return Err(InvalidReason::OverBudget {
            amount: proposal.payment_amount,
            max: ctx.max_budget,
        });
    }
    if !validate_payment_address(&proposal.payment_address, ctx.network) {
        return Err(InvalidReason::BadAddress(proposal.payment_address.clone()));
    }
    if proposal.url.len() < MIN_URL_LEN || proposal.url.chars().any(char::is_whitespace) {
        return Err(InvalidReason::BadUrl);
    }
    let limit = ctx.max_data_size * 2;
    if data_hex_len > limit {
        return Err(InvalidReason::PayloadTooLarge {
            size: data_hex_len,
            limit,
        });
    }
    Ok(())
}

pub fn check_superblock(sb: &Superblock, ctx: &ValidityContext) -> Result<(), InvalidReason> {
    if sb.payment_addresses.len() != sb.payment_amounts.len() {
        return Err(InvalidReason::LengthMismatch {
            addresses: sb.payment_addresses.len(),
            amounts: sb.payment_amounts.len(),
        });
    }
    if sb.payment_addresses.is_empty() {
        return Err(InvalidReason::EmptySuperblock);
    }
    if !sb.proposal_hashes.is_empty() && sb.proposal_hashes.len() != sb.payment_amounts.len() {
        return Err(InvalidReason::ProposalHashMismatch {
            hashes: sb.proposal_hashes.len(),
            payments: sb.payment_amounts.len(),
        });
    }
    if let Some(bad) = sb
        .payment_addresses
        .iter()
        .find(|a| !validate_payment_address(a, ctx.network))
    {
        return Err(InvalidReason::BadAddress(bad.clone()));
    }
    if sb.payment_amounts.iter().any(Amount::is_zero) {
        return Err(InvalidReason::ZeroAmount);
    }
    Ok(())
}

pub fn check_object(object: &GovernanceObject, ctx: &ValidityContext) -> Result<(), InvalidReason> {
    match &object.kind {
        GovernanceKind::Proposal(p) => check_proposal(p, object.data_hex.len(), ctx),
        GovernanceKind::Superblock(sb) => check_superblock(sb, ctx),
    }
}
