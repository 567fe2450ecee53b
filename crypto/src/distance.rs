//! Absolute distance between two 256-bit big-endian integers.

use std::cmp::Ordering;

/// `|a - b|` where both operands are big-endian 256-bit unsigned integers.
pub fn abs_distance(a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
    let (hi, lo) = match a.cmp(b) {
        Ordering::Less => (b, a),
        _ => (a, b),
    };
    let mut out = [0u8; 32];
    let mut borrow = 0i16;
    for i in (0..32).rev() {
        let mut diff = hi[i] as i16 - lo[i] as i16 - borrow;
        if diff < 0 {
            diff += 256;
            borrow = 1;
        } else {
            borrow = 0;
        }
        out[i] = diff as u8;
    }
    out
}
