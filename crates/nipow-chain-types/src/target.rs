//! Compact targets, difficulty and depth.
//!
//! nBits format: 0x[size][word]
//! - size: 1 byte indicating the byte length of the target
//! - word: 3 bytes holding the most significant bytes of the target
//!
//! Depth of a target `t` is `floor(log2(MAX_TARGET / t))`.

use crate::Hash;
use num_bigint::BigUint;
use num_traits::{One, Zero};
use once_cell::sync::Lazy;

/// Compact encoding of the easiest target below the maximum (depth 0).
pub const DEFAULT_NBITS: u32 = 0x2100ffff;

/// Depth reported for a zero target.
pub const MAX_DEPTH: u32 = 256;

static BLOCK_TARGET_MAX: Lazy<BigUint> =
    Lazy::new(|| (BigUint::one() << 256u32) - BigUint::one());

/// Maximum target value (2^256 - 1).
pub fn block_target_max() -> &'static BigUint {
    &BLOCK_TARGET_MAX
}

/// Convert nBits compact representation to a target.
pub fn nbits_to_target(nbits: u32) -> BigUint {
    let size = ((nbits >> 24) & 0xff) as usize;
    let word = nbits & 0x007fffff;

    if size == 0 {
        return BigUint::zero();
    }

    if size <= 3 {
        BigUint::from(word >> (8 * (3 - size)))
    } else {
        BigUint::from(word) << (8 * (size - 3))
    }
}

/// Convert a target to its nBits compact representation.
///
/// Precision beyond the three most significant bytes is dropped.
pub fn target_to_nbits(target: &BigUint) -> u32 {
    if target.is_zero() {
        return 0;
    }

    let bytes = target.to_bytes_be();
    let len = bytes.len() as u32;

    let word = if len <= 3 {
        let mut value = 0u32;
        for &b in &bytes {
            value = (value << 8) | b as u32;
        }
        value << (8 * (3 - len))
    } else {
        ((bytes[0] as u32) << 16) | ((bytes[1] as u32) << 8) | (bytes[2] as u32)
    };

    // Keep the sign bit clear
    if word & 0x00800000 != 0 {
        ((len + 1) << 24) | (word >> 8)
    } else {
        (len << 24) | word
    }
}

/// `floor(log2(MAX_TARGET / target))`.
pub fn target_depth(target: &BigUint) -> u32 {
    if target.is_zero() {
        return MAX_DEPTH;
    }

    let ratio = block_target_max() / target;
    let bits = ratio.bits();
    if bits == 0 {
        0
    } else {
        (bits - 1) as u32
    }
}

/// Interpret a PoW hash as a big-endian target value.
pub fn hash_to_target(hash: &Hash) -> BigUint {
    BigUint::from_bytes_be(hash.as_bytes())
}

/// Difficulty = MaxTarget / Target.
pub fn target_to_difficulty(target: &BigUint) -> BigUint {
    if target.is_zero() {
        return block_target_max().clone();
    }
    block_target_max() / target
}
