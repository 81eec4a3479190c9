//! Search behaviour: agreement with verification, window coverage and
//! cancellation when the tip moves.

use std::sync::atomic::{AtomicU32, Ordering};

use proptest::prelude::*;
use stake_kernel::chain::ChainPosition;
use stake_kernel::core::OutPoint;
use stake_kernel::{
    BlockHash, ChainIndex, ChainView, KernelError, KernelHashEngine, NetworkParams, SearchState,
    StakeCandidate, StakeCheckError, TxId,
};
use stake_kernel_testkit::fixtures::derive_hash;
use stake_kernel_testkit::{ChainBuilder, StakerKey, IMPOSSIBLE_BITS};

/// Target near 2^234: weighted by a 1e8 coin, roughly one probe in four hits.
const QUARTER_BITS: u32 = 0x1e043100;

fn setup() -> (ChainIndex, StakeCandidate, NetworkParams) {
    let params = NetworkParams::mainnet();
    let key = StakerKey::from_seed([0x31; 32]);
    let mut builder = ChainBuilder::new(params.clone(), 1_000_020, 60);
    let coin = builder.fund(100_000_000, key.lock_script());
    builder.work_blocks(60);
    let (chain, _) = builder.build();
    (chain, coin, params)
}

fn with_prevout(coin: &StakeCandidate, n: u64) -> StakeCandidate {
    StakeCandidate {
        prevout: OutPoint::new(TxId(derive_hash("search", n)), (n % 4) as u32),
        ..*coin
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_v2_search_agrees_with_verify(n in 0u64..10_000, lead in 0i64..600) {
        let (chain, coin, params) = setup();
        let coin = with_prevout(&coin, n);
        let tip = chain.tip().unwrap();
        let engine = KernelHashEngine::new(&chain, &params);
        let start = i64::from(coin.block_from_time + params.stake_min_age) + lead;

        let mut state = SearchState::default();
        if let Some(hit) = engine.search_v2(&tip, &coin, start, QUARTER_BITS, &mut state).unwrap() {
            let verified = engine.check_v2(&tip, &coin, hit.time, QUARTER_BITS).unwrap();
            prop_assert_eq!(verified, hit.hash_proof_of_stake);
            prop_assert_eq!(i64::from(hit.time) % i64::from(params.stake_interval), 0);
        }
    }

    #[test]
    fn test_v1_search_agrees_with_verify(n in 0u64..10_000, lead in 0i64..600) {
        let (chain, coin, params) = setup();
        let coin = with_prevout(&coin, n);
        let engine = KernelHashEngine::new(&chain, &params);
        let start = i64::from(coin.block_from_time + params.stake_min_age) + lead;

        let mut state = SearchState::default();
        if let Some(hit) = engine.search_v1(&coin, start, QUARTER_BITS, &mut state).unwrap() {
            let verified = engine.check_v1(&coin, hit.time, QUARTER_BITS).unwrap();
            prop_assert_eq!(verified, hit.hash_proof_of_stake);
        }
    }
}

#[test]
fn test_v2_search_returns_first_hit_in_window() {
    let (chain, coin, params) = setup();
    let tip = chain.tip().unwrap();
    let engine = KernelHashEngine::new(&chain, &params);
    let interval = i64::from(params.stake_interval);

    for n in 0..16 {
        let coin = with_prevout(&coin, n);
        let start = i64::from(coin.block_from_time + params.stake_min_age) + 300;

        let mut state = SearchState::default();
        let hit = engine
            .search_v2(&tip, &coin, start, QUARTER_BITS, &mut state)
            .unwrap();

        // Window start: back toward the tip, capped by max_past_time_secs.
        let t = start - start.rem_euclid(interval);
        let median = chain.active_tip_median_time_past().unwrap();
        let diff = (t - median).min(t - tip.time_i64() + i64::from(params.max_past_time_secs) - 1);
        let first = if diff > 1 { t - (diff / interval) * interval } else { t };
        let end = hit.map_or(t + i64::from(params.max_future_drift), |h| i64::from(h.time));

        let mut t = first;
        while t < end {
            let eligible = t >= i64::from(coin.block_from_time + params.stake_min_age);
            if eligible {
                let err = engine
                    .check_v2(&tip, &coin, t as u32, QUARTER_BITS)
                    .unwrap_err();
                assert!(
                    matches!(err, KernelError::Stake(StakeCheckError::TargetMiss { .. })),
                    "time {} skipped a hit",
                    t
                );
            }
            t += interval;
        }
    }
}

#[test]
fn test_v2_search_on_same_tip_resumes() {
    let (chain, coin, params) = setup();
    let tip = chain.tip().unwrap();
    let engine = KernelHashEngine::new(&chain, &params);
    let start = i64::from(coin.block_from_time + params.stake_min_age) + 300;

    let mut state = SearchState::default();
    assert!(engine
        .search_v2(&tip, &coin, start, IMPOSSIBLE_BITS, &mut state)
        .unwrap()
        .is_none());
    let first_pass_end = state.last_hashed_time;

    // Same start on the same tip: the whole window is already covered.
    assert!(engine
        .search_v2(&tip, &coin, start, IMPOSSIBLE_BITS, &mut state)
        .unwrap()
        .is_none());
    assert_eq!(state.last_hashed_time, first_pass_end);

    // One interval later only the new tail is probed.
    let later = start + 10;
    assert!(engine
        .search_v2(&tip, &coin, later, IMPOSSIBLE_BITS, &mut state)
        .unwrap()
        .is_none());
    assert_eq!(state.last_hashed_time, first_pass_end + 10);
}

/// A chain whose tip advances after a fixed number of height reads.
struct AdvancingChain {
    inner: ChainIndex,
    reads: AtomicU32,
    advance_after: u32,
}

impl ChainView for AdvancingChain {
    fn position_by_hash(&self, hash: &BlockHash) -> Option<ChainPosition> {
        self.inner.position_by_hash(hash)
    }

    fn position_at_height(&self, height: u32) -> Option<ChainPosition> {
        self.inner.position_at_height(height)
    }

    fn active_tip_height(&self) -> Option<u32> {
        let reads = self.reads.fetch_add(1, Ordering::SeqCst);
        let height = self.inner.active_tip_height()?;
        if reads >= self.advance_after {
            Some(height + 1)
        } else {
            Some(height)
        }
    }

    fn active_tip_median_time_past(&self) -> Option<i64> {
        self.inner.active_tip_median_time_past()
    }

    fn ancestors_back_to(&self, from: &ChainPosition, time_floor: i64) -> Vec<ChainPosition> {
        self.inner.ancestors_back_to(from, time_floor)
    }
}

#[test]
fn test_v2_search_cancelled_when_tip_moves() {
    let (chain, coin, params) = setup();
    let tip = chain.tip().unwrap();
    let start = i64::from(coin.block_from_time + params.stake_min_age) + 3_000;
    let full_window_end = start + i64::from(params.max_future_drift) - i64::from(params.stake_interval);

    let advancing = AdvancingChain {
        inner: chain,
        reads: AtomicU32::new(0),
        advance_after: 6,
    };
    let engine = KernelHashEngine::new(&advancing, &params);

    let mut state = SearchState::default();
    let result = engine
        .search_v2(&tip, &coin, start, IMPOSSIBLE_BITS, &mut state)
        .unwrap();
    assert!(result.is_none());
    assert!(state.last_hashed_time < full_window_end);
}

#[test]
fn test_v1_search_cancelled_when_tip_moves() {
    let (chain, coin, params) = setup();
    let start = i64::from(coin.block_from_time + params.stake_min_age) + 3_000;

    let advancing = AdvancingChain {
        inner: chain,
        reads: AtomicU32::new(0),
        advance_after: 10,
    };
    let engine = KernelHashEngine::new(&advancing, &params);

    let mut state = SearchState::default();
    let result = engine
        .search_v1(&coin, start, IMPOSSIBLE_BITS, &mut state)
        .unwrap();
    assert!(result.is_none());
    // Probes run downward from start + drift; a full pass would reach below start.
    assert!(state.last_hashed_time > start);
}
