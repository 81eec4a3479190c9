//! Stake modifier chain.
//!
//! The stake modifier keeps a coin owner from computing, at the time a coin
//! confirms, the future proofs that coin will produce. A kernel must hash
//! with a modifier that is only fixed a full selection interval after the
//! coin's block.
//!
//! - **V1**: 64 bits, one per selection round, each taken from the entropy
//!   bit of a block chosen by ranking recent blocks on
//!   `Hash(block_hash ‖ previous_modifier)`. Regenerated at most once per
//!   modifier-interval bucket.
//! - **V2**: a straight hash chain, `Hash(kernel ‖ previous_modifier_v2)`.
//!
//! Everything here is a pure function of committed block timestamps and
//! hashes; no clock is read.

use stake_kernel_core::{
    checksum_hash, modifier_v2_hash, selection_hash, BlockHash, Hash256, NetworkParams,
    FIRST_BLOCK_STAKE_MODIFIER, MODIFIER_BITS,
};
use tracing::{debug, error, trace};

use crate::error::{ChainError, Result};
use crate::position::ChainPosition;
use crate::traits::ChainView;

/// Result of computing the V1 modifier for the next block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextModifier {
    pub modifier: u64,
    /// Whether a new modifier was generated (vs. carried forward).
    pub generated: bool,
}

/// The V1 modifier a coin must hash with, and where it was generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelModifier {
    pub modifier: u64,
    pub height: u32,
    pub time: i64,
}

/// Modifier computations over a chain view.
pub struct StakeModifierChain<'a, C: ChainView + ?Sized> {
    chain: &'a C,
    params: &'a NetworkParams,
}

impl<'a, C: ChainView + ?Sized> StakeModifierChain<'a, C> {
    pub fn new(chain: &'a C, params: &'a NetworkParams) -> Self {
        Self { chain, params }
    }

    /// Nearest modifier generated at or before `position`, with its block time.
    fn last_stake_modifier(&self, position: &ChainPosition) -> Result<(u64, i64)> {
        let mut current = *position;
        while !current.generated_stake_modifier {
            match self.chain.previous(&current) {
                Some(prev) => current = prev,
                None => break,
            }
        }

        if !current.generated_stake_modifier {
            error!(
                height = position.height,
                "no stake modifier generated back to genesis; chain index inconsistent"
            );
            return Err(ChainError::ModifierChainExhausted {
                height: position.height,
            });
        }

        Ok((current.stake_modifier, current.time_i64()))
    }

    /// Compute the V1 modifier for the block following `prev`.
    pub fn compute_next_stake_modifier(&self, prev: Option<&ChainPosition>) -> Result<NextModifier> {
        let prev = match prev {
            // Genesis block's modifier is 0.
            None => {
                return Ok(NextModifier {
                    modifier: 0,
                    generated: true,
                })
            }
            Some(prev) => prev,
        };

        if prev.height == 0 {
            return Ok(NextModifier {
                modifier: FIRST_BLOCK_STAKE_MODIFIER,
                generated: true,
            });
        }

        let (last_modifier, last_modifier_time) = self.last_stake_modifier(prev)?;
        debug!(
            modifier = last_modifier,
            time = last_modifier_time,
            height = prev.height,
            "previous stake modifier"
        );

        let params = self.params;
        if params.modifier_bucket(last_modifier_time) >= params.modifier_bucket(prev.time_i64()) {
            return Ok(NextModifier {
                modifier: last_modifier,
                generated: false,
            });
        }

        let interval = i64::from(params.modifier_interval);
        let selection_start =
            (prev.time_i64() / interval) * interval - params.selection_interval();

        let mut candidates = self.chain.ancestors_back_to(prev, selection_start);
        let first_candidate_height = candidates.last().map_or(prev.height, |c| c.height);
        sort_candidates(&mut candidates);

        let rounds = MODIFIER_BITS.min(candidates.len());
        let mut selected = vec![false; candidates.len()];
        let mut selection_stop = selection_start;
        let mut new_modifier = 0u64;

        for round in 0..rounds {
            selection_stop += params.selection_interval_section(round)?;

            let chosen = self
                .select_from_candidates(&candidates, &selected, selection_stop, last_modifier)
                .ok_or_else(|| {
                    error!(round, height = prev.height, "unable to select block");
                    ChainError::NoCandidateSelected { round }
                })?;

            let block = &candidates[chosen];
            new_modifier |= u64::from(block.entropy_bit) << round;
            selected[chosen] = true;

            trace!(
                round,
                stop = selection_stop,
                height = block.height,
                bit = block.entropy_bit,
                "selected block"
            );
        }

        trace!(
            from = first_candidate_height,
            to = prev.height,
            map = %selection_map(&candidates, &selected, first_candidate_height, prev.height),
            "selection map"
        );
        debug!(
            modifier = new_modifier,
            time = prev.time,
            height = prev.height + 1,
            "generated stake modifier"
        );

        Ok(NextModifier {
            modifier: new_modifier,
            generated: true,
        })
    }

    /// Pick the unselected candidate with the smallest selection hash among
    /// those up to `stop`. If none is at or before `stop`, the first
    /// unselected candidate after it is taken.
    fn select_from_candidates(
        &self,
        candidates: &[ChainPosition],
        selected: &[bool],
        stop: i64,
        prev_modifier: u64,
    ) -> Option<usize> {
        let mut best: Option<(Hash256, usize)> = None;

        for (i, candidate) in candidates.iter().enumerate() {
            if best.is_some() && candidate.time_i64() > stop {
                break;
            }
            if selected[i] {
                continue;
            }

            let mut hash = selection_hash(self.params.hash_algorithm, &candidate.hash, prev_modifier);
            // Favor stake blocks over work blocks.
            if candidate.proof_of_stake {
                hash = hash.shr(32);
            }

            match best {
                Some((best_hash, _)) if hash >= best_hash => {}
                _ => best = Some((hash, i)),
            }
        }

        best.map(|(_, i)| i)
    }

    /// The V1 modifier a coin created in `block_from` must use: the one in
    /// force a full selection interval after that block.
    pub fn kernel_stake_modifier(&self, block_from: &BlockHash) -> Result<KernelModifier> {
        let from = self
            .chain
            .position_by_hash(block_from)
            .ok_or(ChainError::PositionNotFound(*block_from))?;

        let deadline = from.time_i64() + self.params.selection_interval();
        let mut modifier_height = from.height;
        let mut modifier_time = from.time_i64();
        let mut current = from;

        while modifier_time < deadline {
            current = self
                .chain
                .position_at_height(current.height + 1)
                .ok_or(ChainError::ModifierNotYetDeterminable {
                    block_from: *block_from,
                    height: current.height,
                })?;

            if current.generated_stake_modifier {
                modifier_height = current.height;
                modifier_time = current.time_i64();
            }
        }

        Ok(KernelModifier {
            modifier: current.stake_modifier,
            height: modifier_height,
            time: modifier_time,
        })
    }
}

/// Order selection candidates by time, then by hash value.
fn sort_candidates(candidates: &mut [ChainPosition]) {
    candidates.sort_by(|a, b| a.time.cmp(&b.time).then_with(|| a.hash.cmp(&b.hash)));
}

/// V2 modifier for the block following `prev`: `Hash(kernel ‖ prev.modifier_v2)`.
pub fn compute_stake_modifier_v2(
    params: &NetworkParams,
    prev: Option<&ChainPosition>,
    kernel: &Hash256,
) -> Hash256 {
    match prev {
        None => Hash256::ZERO,
        Some(prev) => modifier_v2_hash(params.hash_algorithm, kernel, &prev.stake_modifier_v2),
    }
}

/// Running checksum: the top 32 bits of
/// `Hash(prev_checksum ‖ flags ‖ proof_hash ‖ modifier)`. Genesis has no
/// previous checksum and hashes only the last three fields.
pub fn stake_modifier_checksum(
    params: &NetworkParams,
    prev: Option<&ChainPosition>,
    flags: u32,
    hash_proof_of_stake: &Hash256,
    modifier: u64,
) -> u32 {
    let prev_checksum = prev.map(|p| p.stake_modifier_checksum);
    let hash = checksum_hash(
        params.hash_algorithm,
        prev_checksum,
        flags,
        hash_proof_of_stake,
        modifier,
    );
    hash.shr(224).low_u64() as u32
}

/// Whether `checksum` agrees with the hard checkpoint at `height`, if any.
pub fn check_modifier_checkpoint(params: &NetworkParams, height: u32, checksum: u32) -> Result<()> {
    match params.modifier_checkpoints.get(&height) {
        Some(&expected) if expected != checksum => Err(ChainError::CheckpointMismatch {
            height,
            expected,
            got: checksum,
        }),
        _ => Ok(()),
    }
}

/// Visual map of a selection window for diagnostics.
///
/// `-` work block, `=` stake block, `W`/`S` selected work/stake block.
fn selection_map(
    candidates: &[ChainPosition],
    selected: &[bool],
    first_height: u32,
    last_height: u32,
) -> String {
    let len = (last_height.saturating_sub(first_height) + 1) as usize;
    let mut map = vec![b'-'; len];
    for (candidate, chosen) in candidates.iter().zip(selected) {
        let Some(slot) = candidate
            .height
            .checked_sub(first_height)
            .and_then(|offset| map.get_mut(offset as usize))
        else {
            continue;
        };
        *slot = match (candidate.proof_of_stake, *chosen) {
            (true, true) => b'S',
            (false, true) => b'W',
            (true, false) => b'=',
            (false, false) => b'-',
        };
    }
    String::from_utf8(map).unwrap_or_default()
}
