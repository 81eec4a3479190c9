//! Error types for the stake kernel core.

use thiserror::Error;

use crate::types::{Amount, Timestamp};

/// Core errors: malformed inputs and configuration.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("compact target {0:#010x} has the sign bit set")]
    NegativeTarget(u32),

    #[error("compact target {0:#010x} overflows 256 bits")]
    TargetOverflow(u32),

    #[error("selection interval section {0} out of range [0, 64)")]
    SectionOutOfRange(usize),

    #[error("invalid network parameters: {0}")]
    InvalidParams(String),

    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Preconditions a kernel candidate must satisfy before any hashing.
///
/// These are ordinary rejections, not faults.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StakeCheckError {
    #[error("stake value is zero")]
    ZeroValue,

    #[error("candidate time {time_tx} precedes source block time {block_from_time}")]
    TimeBeforeSource {
        block_from_time: Timestamp,
        time_tx: Timestamp,
    },

    #[error("min age violation: source time {block_from_time} + min age {min_age} > candidate time {time_tx}")]
    MinAgeViolation {
        block_from_time: Timestamp,
        min_age: u32,
        time_tx: Timestamp,
    },

    #[error("coinstake timestamp {tx_time} differs from block timestamp {block_time}")]
    CoinstakeTimestampMismatch { block_time: i64, tx_time: i64 },

    #[error("kernel hash does not meet weighted target (value {value})")]
    TargetMiss { value: Amount },
}
