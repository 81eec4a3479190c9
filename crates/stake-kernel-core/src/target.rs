//! Difficulty targets and the weighted stake target test.

use num_bigint::BigUint;
use std::fmt;

use crate::error::CoreError;
use crate::types::{Amount, Hash256};

/// Stake weight is the coin value divided by this.
pub const STAKE_WEIGHT_DIVISOR: u64 = 100;

/// A 256-bit target decoded from compact bits.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Target(BigUint);

impl Target {
    /// Decode the compact `exponent:8 | sign:1 | mantissa:23` encoding.
    pub fn from_compact(bits: u32) -> Result<Self, CoreError> {
        let size = bits >> 24;
        let word = bits & 0x007f_ffff;

        if word != 0 && bits & 0x0080_0000 != 0 {
            return Err(CoreError::NegativeTarget(bits));
        }
        if word != 0
            && (size > 34 || (word > 0xff && size > 33) || (word > 0xffff && size > 32))
        {
            return Err(CoreError::TargetOverflow(bits));
        }

        let value = if size <= 3 {
            BigUint::from(word >> (8 * (3 - size)))
        } else {
            BigUint::from(word) << (8 * (size - 3) as usize)
        };
        Ok(Self(value))
    }

    /// Encode back to compact bits (lossy below the mantissa precision).
    pub fn to_compact(&self) -> u32 {
        if self.0 == BigUint::from(0u32) {
            return 0;
        }
        let bytes = self.0.to_bytes_be();
        let mut size = bytes.len() as u32;
        let mut word: u32 = if bytes.len() <= 3 {
            let mut w = 0u32;
            for b in &bytes {
                w = (w << 8) | u32::from(*b);
            }
            w << (8 * (3 - bytes.len() as u32))
        } else {
            (u32::from(bytes[0]) << 16) | (u32::from(bytes[1]) << 8) | u32::from(bytes[2])
        };
        if word & 0x0080_0000 != 0 {
            word >>= 8;
            size += 1;
        }
        word | (size << 24)
    }

    /// Build from a 256-bit value.
    pub fn from_hash(value: &Hash256) -> Self {
        Self(BigUint::from_bytes_le(&value.0))
    }

    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Target({:#x})", self.0)
    }
}

/// Interpret a hash as a 256-bit little-endian integer.
pub fn hash_to_biguint(hash: &Hash256) -> BigUint {
    BigUint::from_bytes_le(&hash.0)
}

/// Stake weight of a coin. Non-positive values carry no weight.
pub fn stake_weight(value: Amount) -> u64 {
    if value <= 0 {
        return 0;
    }
    value as u64 / STAKE_WEIGHT_DIVISOR
}

/// `hash < (value / 100) * target`, without truncating the product.
pub fn stake_target_hit(hash: &Hash256, value: Amount, target: &Target) -> bool {
    let weighted = BigUint::from(stake_weight(value)) * target.as_biguint();
    hash_to_biguint(hash) < weighted
}
