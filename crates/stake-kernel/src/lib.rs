//! # Stake Kernel
//!
//! Proof-of-stake eligibility: given a coin, a timestamp and a difficulty
//! target, decide whether the coin may produce the next block.
//!
//! ## Overview
//!
//! - **Modifiers**: unpredictable per-block values folded into every kernel
//!   hash (see [`chain::StakeModifierChain`])
//! - **Kernel hash**: a hash over the modifier, the coin and a timestamp,
//!   compared against the coin-weighted target ([`KernelHashEngine`])
//! - **Validation**: the full check of a received stake block
//!   ([`ProofOfStakeValidator`])
//! - **Staking**: a cancellable search for a hitting timestamp ([`Staker`])
//!
//! ## Usage
//!
//! ```rust,no_run
//! use stake_kernel::{KernelHashEngine, SearchState};
//! use stake_kernel::chain::{ChainIndex, ChainView};
//! use stake_kernel::core::{NetworkParams, StakeCandidate};
//!
//! fn example(chain: &ChainIndex, coin: &StakeCandidate, now: i64, bits: u32) {
//!     let params = NetworkParams::mainnet();
//!     let engine = KernelHashEngine::new(chain, &params);
//!     let tip = chain.tip().unwrap();
//!
//!     let mut state = SearchState::default();
//!     if let Ok(Some(hit)) = engine.search_v2(&tip, coin, now, bits, &mut state) {
//!         // Stake at hit.time
//!     }
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `stake_kernel::core` - Pure primitives (hash layouts, targets, params)
//! - `stake_kernel::chain` - Chain view, arena and modifier chain

pub mod config;
pub mod engine;
pub mod error;
pub mod external;
pub mod staker;
pub mod validator;

// Re-export component crates
pub use stake_kernel_chain as chain;
pub use stake_kernel_core as core;

pub use config::{KernelConfig, DEFAULT_STAKER_POLL_MS, DEFAULT_STAKING_PROTOCOL_V2_HEIGHT};
pub use engine::{hash_and_compare, KernelHashEngine, KernelRule, SearchState, StakeHit, StakeModifier};
pub use error::{KernelError, Result};
pub use external::{
    ActivationSource, ParameterId, ScriptFlags, ScriptVerifier, SignatureContext, StaticActivation,
};
pub use staker::{search_candidates, system_time, FoundStake, Staker, TimeSource, TipUpdate};
pub use validator::{ProofOfStake, ProofOfStakeValidator};

// Re-export commonly used types
pub use stake_kernel_chain::{ChainError, ChainIndex, ChainPosition, ChainView, SharedChain, TransactionStore};
pub use stake_kernel_core::{
    Block, BlockHash, BlockHeader, Hash256, NetworkParams, StakeCandidate, StakeCheckError, Target,
    Transaction, TxId,
};
