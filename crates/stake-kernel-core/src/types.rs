//! Strong type definitions for the stake kernel.
//!
//! Block hashes and transaction ids are distinct newtypes over the same
//! 32-byte representation so they cannot be swapped at compile time.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Monetary amount in the smallest unit.
pub type Amount = i64;

/// Block or candidate timestamp, seconds since the Unix epoch.
///
/// Kernel hash inputs serialize timestamps as 32-bit little-endian values.
pub type Timestamp = u32;

/// A 256-bit value in serialization byte order.
///
/// Numerically the bytes are a little-endian integer, so `bytes[31]` is the
/// most significant byte. Ordering follows the numeric value.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    /// The zero value.
    pub const ZERO: Self = Self([0u8; 32]);

    /// All bits set.
    pub const MAX: Self = Self([0xff; 32]);

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Create from a u64, placed in the least significant bytes.
    pub fn from_u64(value: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&value.to_le_bytes());
        Self(bytes)
    }

    /// The least significant 64 bits.
    pub fn low_u64(&self) -> u64 {
        let mut word = [0u8; 8];
        word.copy_from_slice(&self.0[..8]);
        u64::from_le_bytes(word)
    }

    /// Logical right shift of the numeric value.
    pub fn shr(&self, bits: u32) -> Self {
        if bits >= 256 {
            return Self::ZERO;
        }
        let byte_shift = (bits / 8) as usize;
        let bit_shift = bits % 8;
        let mut out = [0u8; 32];
        for (i, slot) in out.iter_mut().enumerate().take(32 - byte_shift) {
            let lo = self.0[i + byte_shift];
            let hi = if i + byte_shift + 1 < 32 {
                self.0[i + byte_shift + 1]
            } else {
                0
            };
            *slot = if bit_shift == 0 {
                lo
            } else {
                (lo >> bit_shift) | (hi << (8 - bit_shift))
            };
        }
        Self(out)
    }

    /// Whether every byte is zero.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Convert to hex string in serialization byte order.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string in serialization byte order.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl Ord for Hash256 {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.iter().rev().cmp(other.0.iter().rev())
    }
}

impl PartialOrd for Hash256 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl AsRef<[u8]> for Hash256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

macro_rules! hash_newtype {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub Hash256);

        impl $name {
            /// The zero identifier (sentinel).
            pub const ZERO: Self = Self(Hash256::ZERO);

            /// Create from raw bytes.
            pub const fn from_bytes(bytes: [u8; 32]) -> Self {
                Self(Hash256(bytes))
            }

            /// Get the raw bytes.
            pub const fn as_bytes(&self) -> &[u8; 32] {
                &self.0 .0
            }

            /// The underlying 256-bit value.
            pub const fn as_hash(&self) -> &Hash256 {
                &self.0
            }

            /// Convert to hex string.
            pub fn to_hex(&self) -> String {
                self.0.to_hex()
            }

            /// Parse from hex string.
            pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
                Hash256::from_hex(s).map(Self)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "({})"), &self.to_hex()[..16])
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", &self.to_hex()[..16])
            }
        }

        impl From<[u8; 32]> for $name {
            fn from(bytes: [u8; 32]) -> Self {
                Self::from_bytes(bytes)
            }
        }

        impl From<Hash256> for $name {
            fn from(hash: Hash256) -> Self {
                Self(hash)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0 .0
            }
        }
    };
}

hash_newtype!(
    /// Hash identifying a block.
    BlockHash,
    "BlockHash"
);

hash_newtype!(
    /// Hash identifying a transaction.
    TxId,
    "TxId"
);

/// Reference to a transaction output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    /// Transaction containing the output.
    pub txid: TxId,
    /// Output index within that transaction.
    pub index: u32,
}

impl OutPoint {
    pub const fn new(txid: TxId, index: u32) -> Self {
        Self { txid, index }
    }

    /// The null outpoint used by coinbase inputs.
    pub const NULL: Self = Self {
        txid: TxId::ZERO,
        index: u32::MAX,
    };

    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.index)
    }
}
