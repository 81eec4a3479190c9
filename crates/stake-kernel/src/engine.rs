//! Kernel hash engine.
//!
//! One pure hash-and-compare function, [`hash_and_compare`], with two
//! drivers: verification at a single timestamp, and a windowed search over
//! candidate timestamps for staking.
//!
//! A search is cancelled by the chain itself. The active tip height is
//! re-read before every probe and the window is abandoned as soon as it
//! moves, since a new tip changes the modifier and the target.

use serde::{Deserialize, Serialize};
use stake_kernel_chain::{ChainPosition, ChainView, StakeModifierChain};
use stake_kernel_core::{
    check_kernel_preconditions, is_time_eligible, kernel_hash_v1, kernel_hash_v2,
    stake_target_hit, Hash256, KernelInput, NetworkParams, StakeCandidate, StakeCheckError,
    Target, Timestamp,
};
use tracing::{debug, trace};

use crate::error::Result;

/// Which kernel hash layout and modifier a check uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelRule {
    V1,
    V2,
}

/// The modifier a kernel hash is keyed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StakeModifier {
    V1(u64),
    V2(Hash256),
}

impl StakeModifier {
    pub fn rule(&self) -> KernelRule {
        match self {
            StakeModifier::V1(_) => KernelRule::V1,
            StakeModifier::V2(_) => KernelRule::V2,
        }
    }
}

/// A timestamp at which a candidate meets its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeHit {
    pub time: Timestamp,
    pub hash_proof_of_stake: Hash256,
    pub rule: KernelRule,
}

/// Progress of a staker's search, carried between calls.
///
/// Lets a V2 search on an unchanged tip resume after the last probed time,
/// and lets both rules reach into the past only once per tip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchState {
    pub last_hashed_height: Option<u32>,
    pub last_hashed_time: i64,
}

/// Hash one kernel and test it against the weighted target.
pub fn hash_and_compare(
    params: &NetworkParams,
    modifier: &StakeModifier,
    input: &KernelInput,
    value: i64,
    target: &Target,
) -> (Hash256, bool) {
    let hash = match modifier {
        StakeModifier::V1(modifier) => kernel_hash_v1(params.hash_algorithm, *modifier, input),
        StakeModifier::V2(modifier) => kernel_hash_v2(params.hash_algorithm, modifier, input),
    };
    let hit = stake_target_hit(&hash, value, target);
    (hash, hit)
}

/// Verification and search over a chain view.
pub struct KernelHashEngine<'a, C: ChainView + ?Sized> {
    chain: &'a C,
    params: &'a NetworkParams,
}

impl<'a, C: ChainView + ?Sized> KernelHashEngine<'a, C> {
    pub fn new(chain: &'a C, params: &'a NetworkParams) -> Self {
        Self { chain, params }
    }

    /// V1 modifier for a candidate's source block.
    pub fn modifier_v1(&self, candidate: &StakeCandidate) -> Result<StakeModifier> {
        let found = StakeModifierChain::new(self.chain, self.params)
            .kernel_stake_modifier(&candidate.block_from)?;
        Ok(StakeModifier::V1(found.modifier))
    }

    /// V2 modifier for a block built on `prev`.
    pub fn modifier_v2(&self, prev: &ChainPosition) -> StakeModifier {
        StakeModifier::V2(prev.stake_modifier_v2)
    }

    /// Verify a V1 kernel at `time_tx`, returning the proof hash.
    pub fn check_v1(&self, candidate: &StakeCandidate, time_tx: Timestamp, bits: u32) -> Result<Hash256> {
        check_kernel_preconditions(self.params, candidate.value, candidate.block_from_time, time_tx)?;
        let target = Target::from_compact(bits)?;
        let modifier = self.modifier_v1(candidate)?;
        self.verify(&modifier, candidate, time_tx, &target)
    }

    /// Verify a V2 kernel at `time_tx` for a block built on `prev`.
    pub fn check_v2(
        &self,
        prev: &ChainPosition,
        candidate: &StakeCandidate,
        time_tx: Timestamp,
        bits: u32,
    ) -> Result<Hash256> {
        check_kernel_preconditions(self.params, candidate.value, candidate.block_from_time, time_tx)?;
        let target = Target::from_compact(bits)?;
        self.verify(&self.modifier_v2(prev), candidate, time_tx, &target)
    }

    fn verify(
        &self,
        modifier: &StakeModifier,
        candidate: &StakeCandidate,
        time_tx: Timestamp,
        target: &Target,
    ) -> Result<Hash256> {
        let input = kernel_input(candidate, time_tx);
        let (hash, hit) = hash_and_compare(self.params, modifier, &input, candidate.value, target);
        if !hit {
            debug!(
                rule = ?modifier.rule(),
                prevout = %candidate.prevout,
                block_from_time = candidate.block_from_time,
                time_tx,
                hash = %hash,
                "kernel hash misses target"
            );
            return Err(StakeCheckError::TargetMiss {
                value: candidate.value,
            }
            .into());
        }
        Ok(hash)
    }

    /// Search V2 timestamps around `start_time` for a block built on `prev`.
    ///
    /// Probes step by the stake interval. The first search on a new tip also
    /// reaches back toward the tip's median time past; later searches on the
    /// same tip resume after the last probed time. Returns `Ok(None)` when
    /// nothing hits or the tip moves mid-search.
    pub fn search_v2(
        &self,
        prev: &ChainPosition,
        candidate: &StakeCandidate,
        start_time: i64,
        bits: u32,
        state: &mut SearchState,
    ) -> Result<Option<StakeHit>> {
        check_start(self.params, candidate, start_time)?;
        let target = Target::from_compact(bits)?;
        let modifier = self.modifier_v2(prev);

        let Some(height_start) = self.chain.active_tip_height() else {
            return Ok(None);
        };

        let interval = i64::from(self.params.stake_interval);
        let t = start_time - start_time.rem_euclid(interval);

        let first_offset = if state.last_hashed_height != Some(height_start) {
            let tip_time = self.chain.tip().map_or(t, |tip| tip.time_i64());
            let median = self.chain.active_tip_median_time_past().unwrap_or(tip_time);
            let diff = (t - median).min(t - tip_time + i64::from(self.params.max_past_time_secs) - 1);
            if diff > 1 {
                -(diff / interval) * interval
            } else {
                0
            }
        } else {
            state.last_hashed_time - t + interval
        };

        state.last_hashed_height = Some(height_start);
        let drift = i64::from(self.params.max_future_drift);

        let mut offset = first_offset;
        while offset < drift {
            if self.chain.active_tip_height() != Some(height_start) {
                debug!(height = height_start, "tip moved; abandoning V2 search");
                return Ok(None);
            }

            let try_time = t + offset;
            offset += interval;
            if !is_time_eligible(self.params, candidate.block_from_time, try_time) {
                continue;
            }

            state.last_hashed_time = try_time;
            if let Some(hit) = self.probe(&modifier, candidate, try_time as Timestamp, &target) {
                return Ok(Some(hit));
            }
        }

        Ok(None)
    }

    /// Search V1 timestamps from `start_time + max_future_drift` downward.
    ///
    /// On a new tip the window extends into the past by up to
    /// `max_v1_past_probe` seconds behind median time past. Probes step by
    /// one second. Returns `Ok(None)` when nothing hits or the tip moves.
    pub fn search_v1(
        &self,
        candidate: &StakeCandidate,
        start_time: i64,
        bits: u32,
        state: &mut SearchState,
    ) -> Result<Option<StakeHit>> {
        check_start(self.params, candidate, start_time)?;
        let target = Target::from_compact(bits)?;
        let modifier = self.modifier_v1(candidate)?;

        let Some(height_start) = self.chain.active_tip_height() else {
            return Ok(None);
        };

        let drift = i64::from(self.params.max_future_drift);
        let median = self.chain.active_tip_median_time_past().unwrap_or(start_time);
        let diff = (start_time - median).min(i64::from(self.params.max_v1_past_probe));

        let mut end = drift;
        if diff > 1 && state.last_hashed_height != Some(height_start) {
            end += diff - 1;
        }
        state.last_hashed_height = Some(height_start);

        for i in 0..end {
            if self.chain.active_tip_height() != Some(height_start) {
                debug!(height = height_start, "tip moved; abandoning V1 search");
                return Ok(None);
            }

            let try_time = start_time + drift - i;
            if !is_time_eligible(self.params, candidate.block_from_time, try_time) {
                continue;
            }

            state.last_hashed_time = try_time;
            if let Some(hit) = self.probe(&modifier, candidate, try_time as Timestamp, &target) {
                return Ok(Some(hit));
            }
        }

        Ok(None)
    }

    fn probe(
        &self,
        modifier: &StakeModifier,
        candidate: &StakeCandidate,
        time_tx: Timestamp,
        target: &Target,
    ) -> Option<StakeHit> {
        let input = kernel_input(candidate, time_tx);
        let (hash, hit) = hash_and_compare(self.params, modifier, &input, candidate.value, target);
        if !hit {
            return None;
        }
        trace!(rule = ?modifier.rule(), time_tx, hash = %hash, "kernel hit");
        Some(StakeHit {
            time: time_tx,
            hash_proof_of_stake: hash,
            rule: modifier.rule(),
        })
    }
}

fn kernel_input(candidate: &StakeCandidate, time_tx: Timestamp) -> KernelInput {
    KernelInput {
        block_from_time: candidate.block_from_time,
        prevout: candidate.prevout,
        time_tx,
    }
}

/// Preconditions on the time a search starts from.
fn check_start(
    params: &NetworkParams,
    candidate: &StakeCandidate,
    start_time: i64,
) -> std::result::Result<(), StakeCheckError> {
    let start = Timestamp::try_from(start_time).unwrap_or(if start_time < 0 { 0 } else { u32::MAX });
    check_kernel_preconditions(params, candidate.value, candidate.block_from_time, start)
}
