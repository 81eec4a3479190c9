//! Error types for the kernel.

use stake_kernel_chain::ChainError;
use stake_kernel_core::{BlockHash, CoreError, OutPoint, StakeCheckError, TxId};
use thiserror::Error;

/// Reasons a proof of stake is rejected or a kernel operation fails.
#[derive(Debug, Error)]
pub enum KernelError {
    /// Transaction 1 is missing or not a coinstake.
    #[error("block {0} has no coinstake at index 1")]
    NotCoinstake(BlockHash),

    /// The staked output could not be resolved.
    #[error("staked coin not found: {0}")]
    CoinNotFound(OutPoint),

    /// The coinstake's first input failed script verification.
    #[error("script verification failed on coinstake {0}")]
    ScriptFailed(TxId),

    /// The block containing the staked output is not indexed or unreadable.
    #[error("source block not found: {0}")]
    SourceBlockNotFound(BlockHash),

    /// The resolved transaction is not the one the input references.
    #[error("coinstake input references {expected} but lookup returned {found}")]
    TxIdMismatch { expected: TxId, found: TxId },

    /// Kernel precondition or target failure.
    #[error("kernel check failed: {0}")]
    Stake(#[from] StakeCheckError),

    /// Chain lookup or modifier error.
    #[error("chain error: {0}")]
    Chain(#[from] ChainError),

    /// Malformed input.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// The staker's output channel closed.
    #[error("staker stopped: {0}")]
    StakerStopped(String),
}

impl KernelError {
    /// Whether the failure indicates inconsistent chain data. Every other
    /// error is an ordinary rejection.
    pub fn is_consistency_fault(&self) -> bool {
        match self {
            KernelError::Chain(e) => e.is_consistency_fault(),
            _ => false,
        }
    }
}

/// Result type for kernel operations.
pub type Result<T> = std::result::Result<T, KernelError>;
