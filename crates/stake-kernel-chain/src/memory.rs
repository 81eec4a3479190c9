//! In-memory chain index and transaction store.
//!
//! [`ChainIndex`] is an arena of [`ChainPosition`]s holding the active chain
//! only: blocks connect on the tip and disconnect from it, so an arena slot
//! equals the block height. [`SharedChain`] wraps it for concurrent readers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use stake_kernel_core::{Block, BlockHash, BlockHeader, NetworkParams, Transaction, TxId};
use tracing::{debug, info};

use crate::error::{ChainError, Result};
use crate::modifier::{
    check_modifier_checkpoint, compute_stake_modifier_v2, stake_modifier_checksum,
    StakeModifierChain,
};
use crate::position::{entropy_bit, BlockMeta, ChainPosition};
use crate::traits::{ChainView, TransactionStore};

/// Number of trailing blocks in the median-time-past window.
pub const MEDIAN_TIME_SPAN: usize = 11;

/// Arena-backed active chain.
#[derive(Debug, Clone)]
pub struct ChainIndex {
    params: NetworkParams,
    positions: Vec<ChainPosition>,
    by_hash: HashMap<BlockHash, usize>,
}

impl ChainIndex {
    /// Create an empty chain.
    pub fn new(params: NetworkParams) -> Self {
        Self {
            params,
            positions: Vec::new(),
            by_hash: HashMap::new(),
        }
    }

    pub fn params(&self) -> &NetworkParams {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// All positions, genesis first.
    pub fn positions(&self) -> &[ChainPosition] {
        &self.positions
    }

    /// Connect a block on top of the current tip.
    ///
    /// Computes the V1 and V2 modifiers, the entropy bit and the running
    /// checksum, and enforces any checksum checkpoint at the new height.
    pub fn connect_block(&mut self, meta: BlockMeta) -> Result<ChainPosition> {
        if self.by_hash.contains_key(&meta.hash) {
            return Err(ChainError::AlreadyIndexed(meta.hash));
        }

        let prev = self.positions.last().copied();
        if let Some(tip) = &prev {
            if meta.prev_hash != tip.hash {
                return Err(ChainError::NotExtendingTip {
                    hash: meta.hash,
                    tip: tip.hash,
                });
            }
        }

        let next = StakeModifierChain::new(self, &self.params)
            .compute_next_stake_modifier(prev.as_ref())?;
        let modifier_v2 =
            compute_stake_modifier_v2(&self.params, prev.as_ref(), &meta.modifier_v2_kernel());

        let index = self.positions.len();
        let mut position = ChainPosition {
            index,
            hash: meta.hash,
            prev_hash: meta.prev_hash,
            prev: prev.map(|p| p.index),
            height: index as u32,
            time: meta.time,
            proof_of_stake: meta.proof_of_stake,
            hash_proof_of_stake: if meta.proof_of_stake {
                meta.hash_proof_of_stake
            } else {
                Default::default()
            },
            entropy_bit: entropy_bit(&meta.hash),
            generated_stake_modifier: next.generated,
            stake_modifier: next.modifier,
            stake_modifier_v2: modifier_v2,
            stake_modifier_checksum: 0,
        };

        position.stake_modifier_checksum = stake_modifier_checksum(
            &self.params,
            prev.as_ref(),
            position.flags(),
            &position.hash_proof_of_stake,
            position.stake_modifier,
        );
        check_modifier_checkpoint(&self.params, position.height, position.stake_modifier_checksum)?;

        debug!(
            height = position.height,
            hash = %position.hash,
            modifier = position.stake_modifier,
            generated = position.generated_stake_modifier,
            checksum = position.stake_modifier_checksum,
            "connected block"
        );

        self.by_hash.insert(position.hash, index);
        self.positions.push(position);
        Ok(position)
    }

    /// Remove and return the tip.
    pub fn disconnect_tip(&mut self) -> Option<ChainPosition> {
        let tip = self.positions.pop()?;
        self.by_hash.remove(&tip.hash);
        debug!(height = tip.height, hash = %tip.hash, "disconnected block");
        Some(tip)
    }
}

impl ChainView for ChainIndex {
    fn position_by_hash(&self, hash: &BlockHash) -> Option<ChainPosition> {
        self.by_hash.get(hash).map(|&i| self.positions[i])
    }

    fn position_at_height(&self, height: u32) -> Option<ChainPosition> {
        self.positions.get(height as usize).copied()
    }

    fn active_tip_height(&self) -> Option<u32> {
        self.positions.len().checked_sub(1).map(|h| h as u32)
    }

    fn active_tip_median_time_past(&self) -> Option<i64> {
        if self.positions.is_empty() {
            return None;
        }
        let start = self.positions.len().saturating_sub(MEDIAN_TIME_SPAN);
        let mut times: Vec<i64> = self.positions[start..]
            .iter()
            .map(ChainPosition::time_i64)
            .collect();
        times.sort_unstable();
        Some(times[times.len() / 2])
    }

    fn ancestors_back_to(&self, from: &ChainPosition, time_floor: i64) -> Vec<ChainPosition> {
        let mut out = Vec::new();
        let mut cursor = Some(*from);
        while let Some(position) = cursor {
            if position.time_i64() < time_floor {
                break;
            }
            out.push(position);
            cursor = position.prev.and_then(|i| self.positions.get(i).copied());
        }
        out
    }
}

/// A [`ChainIndex`] shared between a connecting writer and kernel readers.
///
/// The tip height is mirrored in an atomic so a running search can poll it
/// without taking the lock.
#[derive(Debug)]
pub struct SharedChain {
    inner: RwLock<ChainIndex>,
    /// Tip height plus one; zero while the chain is empty.
    tip: AtomicU32,
}

impl SharedChain {
    pub fn new(index: ChainIndex) -> Self {
        let tip = index.len() as u32;
        Self {
            inner: RwLock::new(index),
            tip: AtomicU32::new(tip),
        }
    }

    /// Read access to the underlying index.
    pub fn read(&self) -> RwLockReadGuard<'_, ChainIndex> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ChainIndex> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn connect_block(&self, meta: BlockMeta) -> Result<ChainPosition> {
        let mut index = self.write();
        let position = index.connect_block(meta)?;
        self.tip.store(index.len() as u32, Ordering::Release);
        Ok(position)
    }

    pub fn disconnect_tip(&self) -> Option<ChainPosition> {
        let mut index = self.write();
        let tip = index.disconnect_tip();
        self.tip.store(index.len() as u32, Ordering::Release);
        if let Some(tip) = &tip {
            info!(height = tip.height, hash = %tip.hash, "tip disconnected");
        }
        tip
    }
}

impl ChainView for SharedChain {
    fn position_by_hash(&self, hash: &BlockHash) -> Option<ChainPosition> {
        self.read().position_by_hash(hash)
    }

    fn position_at_height(&self, height: u32) -> Option<ChainPosition> {
        self.read().position_at_height(height)
    }

    fn active_tip_height(&self) -> Option<u32> {
        self.tip.load(Ordering::Acquire).checked_sub(1)
    }

    fn active_tip_median_time_past(&self) -> Option<i64> {
        self.read().active_tip_median_time_past()
    }

    fn ancestors_back_to(&self, from: &ChainPosition, time_floor: i64) -> Vec<ChainPosition> {
        self.read().ancestors_back_to(from, time_floor)
    }
}

/// In-memory transaction and header storage.
///
/// Thread-safe via RwLock.
#[derive(Debug, Default)]
pub struct MemoryTransactionStore {
    inner: RwLock<StoreInner>,
}

#[derive(Debug, Default)]
struct StoreInner {
    /// Transactions by id, with the containing block.
    transactions: HashMap<TxId, (Transaction, BlockHash)>,

    /// Headers by block hash.
    headers: HashMap<BlockHash, BlockHeader>,
}

impl MemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a block's header and every transaction in it.
    pub fn insert_block(&self, block: &Block) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let hash = block.header.hash;
        inner.headers.insert(hash, block.header);
        for tx in &block.transactions {
            inner.transactions.insert(tx.txid, (tx.clone(), hash));
        }
    }

    pub fn insert_transaction(&self, tx: Transaction, block: BlockHash) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.transactions.insert(tx.txid, (tx, block));
    }
}

impl TransactionStore for MemoryTransactionStore {
    fn lookup_transaction(&self, txid: &TxId) -> Option<(Transaction, BlockHash)> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.transactions.get(txid).cloned()
    }

    fn read_block_header(&self, position: &ChainPosition) -> Option<BlockHeader> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.headers.get(&position.hash).copied()
    }
}
