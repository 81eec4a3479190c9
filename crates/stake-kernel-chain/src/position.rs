//! Chain positions: per-block metadata the kernel reads.

use serde::{Deserialize, Serialize};
use stake_kernel_core::{BlockHash, Hash256, Timestamp};

/// Position flag: block is proof-of-stake.
pub const FLAG_PROOF_OF_STAKE: u32 = 1 << 0;
/// Position flag: the block's entropy bit is set.
pub const FLAG_STAKE_ENTROPY: u32 = 1 << 1;
/// Position flag: the block generated a new stake modifier.
pub const FLAG_STAKE_MODIFIER: u32 = 1 << 2;

/// Metadata for one block on the chain.
///
/// `prev` is an index into the owning arena, not a pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainPosition {
    /// Arena slot of this position.
    pub index: usize,
    pub hash: BlockHash,
    pub prev_hash: BlockHash,
    /// Arena slot of the parent, `None` at genesis.
    pub prev: Option<usize>,
    pub height: u32,
    pub time: Timestamp,
    pub proof_of_stake: bool,
    /// Kernel hash for stake blocks, zero for work blocks.
    pub hash_proof_of_stake: Hash256,
    pub entropy_bit: u8,
    pub generated_stake_modifier: bool,
    /// V1 modifier in force at this position.
    pub stake_modifier: u64,
    /// V2 modifier in force at this position.
    pub stake_modifier_v2: Hash256,
    /// Running checksum over modifiers and flags.
    pub stake_modifier_checksum: u32,
}

impl ChainPosition {
    pub fn is_genesis(&self) -> bool {
        self.prev.is_none()
    }

    pub fn time_i64(&self) -> i64 {
        i64::from(self.time)
    }

    /// Flags word fed to the modifier checksum.
    pub fn flags(&self) -> u32 {
        let mut flags = 0;
        if self.proof_of_stake {
            flags |= FLAG_PROOF_OF_STAKE;
        }
        if self.entropy_bit == 1 {
            flags |= FLAG_STAKE_ENTROPY;
        }
        if self.generated_stake_modifier {
            flags |= FLAG_STAKE_MODIFIER;
        }
        flags
    }
}

/// What a caller supplies when connecting a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMeta {
    pub hash: BlockHash,
    pub prev_hash: BlockHash,
    pub time: Timestamp,
    pub proof_of_stake: bool,
    /// Kernel hash for stake blocks; ignored for work blocks.
    pub hash_proof_of_stake: Hash256,
}

impl BlockMeta {
    /// A proof-of-work block.
    pub fn work(hash: BlockHash, prev_hash: BlockHash, time: Timestamp) -> Self {
        Self {
            hash,
            prev_hash,
            time,
            proof_of_stake: false,
            hash_proof_of_stake: Hash256::ZERO,
        }
    }

    /// A proof-of-stake block with its kernel hash.
    pub fn stake(
        hash: BlockHash,
        prev_hash: BlockHash,
        time: Timestamp,
        hash_proof_of_stake: Hash256,
    ) -> Self {
        Self {
            hash,
            prev_hash,
            time,
            proof_of_stake: true,
            hash_proof_of_stake,
        }
    }

    /// Value chained into the V2 modifier: the kernel hash for stake blocks,
    /// the block hash for work blocks.
    pub fn modifier_v2_kernel(&self) -> Hash256 {
        if self.proof_of_stake {
            self.hash_proof_of_stake
        } else {
            *self.hash.as_hash()
        }
    }
}

/// Entropy bit contributed by a block: the lowest bit of its hash.
pub fn entropy_bit(hash: &BlockHash) -> u8 {
    (hash.as_hash().low_u64() & 1) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entropy_bit_uses_lowest_bit() {
        let mut bytes = [0u8; 32];
        bytes[0] = 0x03;
        assert_eq!(entropy_bit(&BlockHash::from_bytes(bytes)), 1);
        bytes[0] = 0x02;
        bytes[31] = 0xff;
        assert_eq!(entropy_bit(&BlockHash::from_bytes(bytes)), 0);
    }

    #[test]
    fn test_modifier_v2_kernel_by_block_kind() {
        let hash = BlockHash::from_bytes([7; 32]);
        let proof = Hash256::from_bytes([9; 32]);
        assert_eq!(
            BlockMeta::work(hash, BlockHash::ZERO, 0).modifier_v2_kernel(),
            *hash.as_hash()
        );
        assert_eq!(
            BlockMeta::stake(hash, BlockHash::ZERO, 0, proof).modifier_v2_kernel(),
            proof
        );
    }
}
