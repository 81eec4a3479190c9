//! # Stake Kernel Core
//!
//! Pure primitives for the proof-of-stake kernel: hash-input layouts,
//! difficulty targets, network parameters and kernel preconditions.
//!
//! This crate contains no I/O beyond loading parameter files, no chain
//! access and no clocks. Everything here is a pure function of its inputs.
//!
//! ## Key Types
//!
//! - [`Hash256`] - 256-bit value ordered as a little-endian integer
//! - [`BlockHash`], [`TxId`] - Identifier newtypes
//! - [`Target`] - Decoded compact difficulty
//! - [`NetworkParams`] - Protocol constants for one network
//! - [`HashAlgorithm`] - The chaining hash
//!
//! ## Hash layouts
//!
//! The exact bytes fed to the chaining hash are fixed in [`canonical`].

pub mod canonical;
pub mod crypto;
pub mod error;
pub mod params;
pub mod target;
pub mod tx;
pub mod types;
pub mod validation;

pub use canonical::{
    checksum_hash, checksum_writer, kernel_hash_v1, kernel_hash_v2, modifier_v2_hash, selection_hash, KernelInput,
};
pub use crypto::{HashAlgorithm, HashWriter};
pub use error::{CoreError, StakeCheckError};
pub use params::{
    Network, NetworkParams, NetworkParamsBuilder, FIRST_BLOCK_STAKE_MODIFIER, MODIFIER_BITS,
    MODIFIER_INTERVAL_RATIO,
};
pub use target::{stake_target_hit, stake_weight, Target, STAKE_WEIGHT_DIVISOR};
pub use tx::{Block, BlockHeader, StakeCandidate, Transaction, TxIn, TxOut};
pub use types::{Amount, BlockHash, Hash256, OutPoint, Timestamp, TxId};
pub use validation::{check_coinstake_timestamp, check_kernel_preconditions, is_time_eligible};
