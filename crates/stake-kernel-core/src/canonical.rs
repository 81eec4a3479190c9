//! Exact hash-input layouts.
//!
//! Independently built nodes must reproduce these byte sequences exactly.
//! Every field is written at its natural width with no delimiters:
//! integers little-endian, 256-bit values as raw bytes.
//!
//! | Hash | Layout |
//! |---|---|
//! | Kernel V1 | `modifier u64 ‖ time_from u32 ‖ index u32 ‖ txid 32 ‖ time_tx u32` |
//! | Kernel V2 | `modifier_v2 32 ‖ time_from u32 ‖ txid 32 ‖ index u32 ‖ time_tx u32` |
//! | Selection | `block_hash 32 ‖ prev_modifier u64` |
//! | Modifier V2 | `kernel 32 ‖ prev_modifier_v2 32` |
//! | Checksum | `[prev_checksum u32] ‖ flags u32 ‖ proof_hash 32 ‖ modifier u64` |
//!
//! The checksum omits `prev_checksum` entirely for genesis.

use crate::crypto::{HashAlgorithm, HashWriter};
use crate::types::{BlockHash, Hash256, OutPoint, Timestamp};

/// Fields that vary per kernel probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelInput {
    pub block_from_time: Timestamp,
    pub prevout: OutPoint,
    pub time_tx: Timestamp,
}

/// V1 kernel hash over a 64-bit modifier.
pub fn kernel_hash_v1(algorithm: HashAlgorithm, modifier: u64, input: &KernelInput) -> Hash256 {
    kernel_writer_v1(algorithm, modifier, input).finish()
}

pub fn kernel_writer_v1(algorithm: HashAlgorithm, modifier: u64, input: &KernelInput) -> HashWriter {
    algorithm
        .writer()
        .u64(modifier)
        .u32(input.block_from_time)
        .u32(input.prevout.index)
        .hash256(input.prevout.txid.as_hash())
        .u32(input.time_tx)
}

/// V2 kernel hash over a 256-bit modifier.
pub fn kernel_hash_v2(
    algorithm: HashAlgorithm,
    modifier_v2: &Hash256,
    input: &KernelInput,
) -> Hash256 {
    kernel_writer_v2(algorithm, modifier_v2, input).finish()
}

pub fn kernel_writer_v2(
    algorithm: HashAlgorithm,
    modifier_v2: &Hash256,
    input: &KernelInput,
) -> HashWriter {
    algorithm
        .writer()
        .hash256(modifier_v2)
        .u32(input.block_from_time)
        .hash256(input.prevout.txid.as_hash())
        .u32(input.prevout.index)
        .u32(input.time_tx)
}

/// Hash ranking a candidate block during V1 modifier selection.
pub fn selection_hash(algorithm: HashAlgorithm, block_hash: &BlockHash, prev_modifier: u64) -> Hash256 {
    algorithm
        .writer()
        .hash256(block_hash.as_hash())
        .u64(prev_modifier)
        .finish()
}

/// Next V2 modifier in the hash chain.
pub fn modifier_v2_hash(algorithm: HashAlgorithm, kernel: &Hash256, prev_modifier_v2: &Hash256) -> Hash256 {
    algorithm
        .writer()
        .hash256(kernel)
        .hash256(prev_modifier_v2)
        .finish()
}

/// Input to the running stake-modifier checksum. `prev_checksum` is `None`
/// for genesis and is then left out of the hashed bytes.
pub fn checksum_hash(
    algorithm: HashAlgorithm,
    prev_checksum: Option<u32>,
    flags: u32,
    proof_hash: &Hash256,
    modifier: u64,
) -> Hash256 {
    checksum_writer(algorithm, prev_checksum, flags, proof_hash, modifier).finish()
}

pub fn checksum_writer(
    algorithm: HashAlgorithm,
    prev_checksum: Option<u32>,
    flags: u32,
    proof_hash: &Hash256,
    modifier: u64,
) -> HashWriter {
    let mut writer = algorithm.writer();
    if let Some(prev_checksum) = prev_checksum {
        writer = writer.u32(prev_checksum);
    }
    writer.u32(flags).hash256(proof_hash).u64(modifier)
}
