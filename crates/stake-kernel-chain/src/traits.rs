//! Read-only interfaces to chain and transaction storage.
//!
//! The kernel is storage-agnostic: block-index persistence and tip tracking
//! belong to the node. [`crate::ChainIndex`] is the in-memory implementation.

use stake_kernel_core::{BlockHash, BlockHeader, Transaction, TxId};

use crate::position::ChainPosition;

/// Read-only access to the block index and active chain.
///
/// Implementations must be safe to share across threads. Reads may observe
/// a newer tip between calls; callers that care re-check the tip height.
pub trait ChainView: Send + Sync {
    /// Look up any indexed block by hash.
    fn position_by_hash(&self, hash: &BlockHash) -> Option<ChainPosition>;

    /// The active-chain block at `height`.
    fn position_at_height(&self, height: u32) -> Option<ChainPosition>;

    /// Height of the active tip, `None` for an empty chain.
    fn active_tip_height(&self) -> Option<u32>;

    /// Median of the last 11 block times ending at the active tip.
    fn active_tip_median_time_past(&self) -> Option<i64>;

    /// Walk back from `from` (inclusive) while block time is at least
    /// `time_floor`. Newest first.
    fn ancestors_back_to(&self, from: &ChainPosition, time_floor: i64) -> Vec<ChainPosition>;

    /// The parent of `position`.
    fn previous(&self, position: &ChainPosition) -> Option<ChainPosition> {
        if position.is_genesis() {
            return None;
        }
        self.position_by_hash(&position.prev_hash)
    }

    /// The active tip.
    fn tip(&self) -> Option<ChainPosition> {
        self.active_tip_height()
            .and_then(|height| self.position_at_height(height))
    }
}

impl<C: ChainView + ?Sized> ChainView for &C {
    fn position_by_hash(&self, hash: &BlockHash) -> Option<ChainPosition> {
        (**self).position_by_hash(hash)
    }

    fn position_at_height(&self, height: u32) -> Option<ChainPosition> {
        (**self).position_at_height(height)
    }

    fn active_tip_height(&self) -> Option<u32> {
        (**self).active_tip_height()
    }

    fn active_tip_median_time_past(&self) -> Option<i64> {
        (**self).active_tip_median_time_past()
    }

    fn ancestors_back_to(&self, from: &ChainPosition, time_floor: i64) -> Vec<ChainPosition> {
        (**self).ancestors_back_to(from, time_floor)
    }
}

impl<C: ChainView + ?Sized> ChainView for std::sync::Arc<C> {
    fn position_by_hash(&self, hash: &BlockHash) -> Option<ChainPosition> {
        (**self).position_by_hash(hash)
    }

    fn position_at_height(&self, height: u32) -> Option<ChainPosition> {
        (**self).position_at_height(height)
    }

    fn active_tip_height(&self) -> Option<u32> {
        (**self).active_tip_height()
    }

    fn active_tip_median_time_past(&self) -> Option<i64> {
        (**self).active_tip_median_time_past()
    }

    fn ancestors_back_to(&self, from: &ChainPosition, time_floor: i64) -> Vec<ChainPosition> {
        (**self).ancestors_back_to(from, time_floor)
    }
}

/// Transaction and header storage.
pub trait TransactionStore: Send + Sync {
    /// A transaction and the hash of the block that contains it.
    fn lookup_transaction(&self, txid: &TxId) -> Option<(Transaction, BlockHash)>;

    /// Read the stored header for an indexed block.
    fn read_block_header(&self, position: &ChainPosition) -> Option<BlockHeader>;
}
