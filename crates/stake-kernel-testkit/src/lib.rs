//! # Stake Kernel Testkit
//!
//! Testing utilities for the stake kernel.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Kernel, selection, modifier and checksum hashes with
//!   known outputs
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: A chain builder, signing keys and coinstake helpers
//!
//! ## Golden Vectors
//!
//! ```rust
//! use stake_kernel_testkit::vectors::verify_all_vectors;
//!
//! for (name, matches, computed) in verify_all_vectors() {
//!     assert!(matches, "{}: {}", name, computed);
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use stake_kernel_testkit::fixtures::{ChainBuilder, StakerKey};
//! use stake_kernel_core::NetworkParams;
//!
//! let key = StakerKey::from_seed([1; 32]);
//! let mut builder = ChainBuilder::new(NetworkParams::mainnet(), 1_000_020, 60);
//! let coin = builder.fund(10_000, key.lock_script());
//! builder.work_blocks(60);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{
    coinstake, stake_block, AcceptAllScripts, ChainBuilder, StakerKey, TestScriptVerifier,
    EASY_BITS, IMPOSSIBLE_BITS,
};
pub use vectors::{all_vectors, verify_all_vectors, KernelVector, VectorModifier};
