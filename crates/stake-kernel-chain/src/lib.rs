//! # Stake Kernel Chain
//!
//! Chain access for the proof-of-stake kernel: the [`ChainView`] and
//! [`TransactionStore`] abstractions, an in-memory arena implementation, and
//! the stake modifier chain computed over them.
//!
//! ## Key Types
//!
//! - [`ChainView`] - Read-only block index and active chain
//! - [`ChainIndex`] - Arena-backed active chain
//! - [`SharedChain`] - `ChainIndex` behind a lock, with a lock-free tip height
//! - [`StakeModifierChain`] - V1 modifier generation and forward lookup
//!
//! ## Design Notes
//!
//! - **Arena indices**: positions link to their parent by arena slot, never
//!   by pointer
//! - **Modifiers on connect**: V1, V2 and the checksum are fixed when a
//!   block connects and never recomputed
//! - **Consistency faults**: see [`ChainError::is_consistency_fault`]

pub mod error;
pub mod memory;
pub mod modifier;
pub mod position;
pub mod traits;

pub use error::{ChainError, Result};
pub use memory::{ChainIndex, MemoryTransactionStore, SharedChain, MEDIAN_TIME_SPAN};
pub use modifier::{
    check_modifier_checkpoint, compute_stake_modifier_v2, stake_modifier_checksum, KernelModifier,
    NextModifier, StakeModifierChain,
};
pub use position::{
    entropy_bit, BlockMeta, ChainPosition, FLAG_PROOF_OF_STAKE, FLAG_STAKE_ENTROPY,
    FLAG_STAKE_MODIFIER,
};
pub use traits::{ChainView, TransactionStore};
