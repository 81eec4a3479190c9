//! Error types for the chain module.

use stake_kernel_core::{BlockHash, CoreError, TxId};
use thiserror::Error;

/// Errors from chain lookups and modifier computation.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Block not present in the index.
    #[error("block not indexed: {0}")]
    PositionNotFound(BlockHash),

    /// Transaction not present in storage.
    #[error("transaction not found: {0}")]
    TransactionNotFound(TxId),

    /// No ancestor generated a stake modifier. Indicates index corruption.
    #[error("no stake modifier generated at or before height {height}")]
    ModifierChainExhausted { height: u32 },

    /// A selection round found no eligible candidate.
    #[error("unable to select block at round {round}")]
    NoCandidateSelected { round: usize },

    /// The forward walk ran off the active tip; retry once the chain grows.
    #[error("stake modifier for {block_from} not yet determinable (walk stopped at height {height})")]
    ModifierNotYetDeterminable { block_from: BlockHash, height: u32 },

    /// A connected block does not build on the current tip.
    #[error("block {hash} does not extend tip {tip}")]
    NotExtendingTip { hash: BlockHash, tip: BlockHash },

    /// The block is already indexed.
    #[error("block already indexed: {0}")]
    AlreadyIndexed(BlockHash),

    /// Stake modifier checksum disagrees with a hard checkpoint.
    #[error("stake modifier checkpoint mismatch at height {height}: expected {expected:#010x}, got {got:#010x}")]
    CheckpointMismatch { height: u32, expected: u32, got: u32 },

    /// Core error.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl ChainError {
    /// Whether this error signals inconsistent chain data rather than a
    /// lookup that may succeed later.
    pub fn is_consistency_fault(&self) -> bool {
        matches!(
            self,
            ChainError::ModifierChainExhausted { .. }
                | ChainError::NoCandidateSelected { .. }
                | ChainError::CheckpointMismatch { .. }
        )
    }
}

/// Result type for chain operations.
pub type Result<T> = std::result::Result<T, ChainError>;
