//! Payment address validation.
//!
//! Address format: base58(version ‖ hash160 ‖ checksum), where checksum is
//! the first 4 bytes of SHA-256d(version ‖ hash160). The version byte selects
//! the network and the script type (pay-to-pubkey-hash or pay-to-script-hash).

use sentinel_types::NetworkId;

use crate::sha256d;

/// Base58 alphabet (no 0, O, I or l).
const BASE58_ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Reverse lookup table: ASCII byte → digit value (0xFF = invalid).
const BASE58_DECODE: [u8; 128] = {
    let mut table = [0xFFu8; 128];
    let alpha = BASE58_ALPHABET;
    let mut i = 0;
    while i < 58 {
        table[alpha[i] as usize] = i as u8;
        i += 1;
    }
    table
};

/// version byte + 20-byte hash.
const PAYLOAD_LEN: usize = 21;
const CHECKSUM_LEN: usize = 4;

/// Decode a base58 string into bytes. Leading `1`s become leading zero bytes.
fn decode_base58(s: &str) -> Option<Vec<u8>> {
    let mut bytes: Vec<u8> = Vec::with_capacity(s.len());
    for c in s.bytes() {
        if c >= 128 {
            return None;
        }
        let mut carry = BASE58_DECODE[c as usize] as u32;
        if carry == 0xFF {
            return None;
        }
        // bytes holds the little-endian big number accumulated so far
        for b in bytes.iter_mut() {
            carry += (*b as u32) * 58;
            *b = (carry & 0xFF) as u8;
            carry >>= 8;
        }
        while carry > 0 {
            bytes.push((carry & 0xFF) as u8);
            carry >>= 8;
        }
    }
    let leading_zeros = s.bytes().take_while(|&c| c == b'1').count();
    bytes.extend(std::iter::repeat(0u8).take(leading_zeros));
    bytes.reverse();
    Some(bytes)
}

/// Decode a base58check string and return the payload (without checksum).
///
/// Returns `None` on invalid characters, short input or checksum mismatch.
pub fn decode_base58check(s: &str) -> Option<Vec<u8>> {
    let raw = decode_base58(s)?;
    if raw.len() < CHECKSUM_LEN + 1 {
        return None;
    }
    let (payload, checksum) = raw.split_at(raw.len() - CHECKSUM_LEN);
    if sha256d(payload)[..CHECKSUM_LEN] != *checksum {
        return None;
    }
    Some(payload.to_vec())
}

/// Validate that `address` is a well-formed payment address for `network`.
pub fn validate_payment_address(address: &str, network: NetworkId) -> bool {
    match decode_base58check(address.trim()) {
        Some(payload) if payload.len() == PAYLOAD_LEN => {
            network.address_versions().contains(&payload[0])
        }
        _ => false,
    }
}
