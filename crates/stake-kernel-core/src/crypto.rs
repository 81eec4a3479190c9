//! The chaining hash.
//!
//! The kernel never defines its own digest; it selects one of the supported
//! algorithms and fixes the byte layout fed to it (see [`crate::canonical`]).

use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::types::Hash256;

/// Digest used for every kernel, selection and modifier hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// SHA-256 applied twice. The consensus digest on public networks.
    #[default]
    Sha256d,
    /// Single BLAKE3. Only for development networks.
    Blake3,
}

impl HashAlgorithm {
    /// Hash a fully assembled input.
    pub fn hash(&self, data: &[u8]) -> Hash256 {
        match self {
            HashAlgorithm::Sha256d => {
                let first = Sha256::digest(data);
                let second = Sha256::digest(first);
                Hash256(second.into())
            }
            HashAlgorithm::Blake3 => Hash256(*blake3::hash(data).as_bytes()),
        }
    }

    /// Start an incremental writer for this algorithm.
    pub fn writer(&self) -> HashWriter {
        HashWriter::new(*self)
    }
}

/// Accumulates fixed-width fields and hashes them in one pass.
///
/// Integers are written little-endian, 256-bit values as their 32 raw bytes,
/// with no delimiters or length prefixes.
#[derive(Debug, Clone)]
pub struct HashWriter {
    algorithm: HashAlgorithm,
    buf: BytesMut,
}

impl HashWriter {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            buf: BytesMut::with_capacity(112),
        }
    }

    pub fn u32(mut self, value: u32) -> Self {
        self.buf.put_u32_le(value);
        self
    }

    pub fn u64(mut self, value: u64) -> Self {
        self.buf.put_u64_le(value);
        self
    }

    pub fn hash256(mut self, value: &Hash256) -> Self {
        self.buf.put_slice(&value.0);
        self
    }

    /// The bytes accumulated so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn finish(self) -> Hash256 {
        self.algorithm.hash(&self.buf)
    }
}
