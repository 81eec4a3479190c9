//! Staking loop.
//!
//! Watches the tip, searches every candidate coin for a kernel hit on a
//! blocking thread, and reports hits on a channel. Block assembly is left to
//! whoever receives the [`FoundStake`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use stake_kernel_chain::{ChainError, ChainView};
use stake_kernel_core::{BlockHash, NetworkParams, OutPoint, StakeCandidate};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, trace, warn};

use crate::config::KernelConfig;
use crate::engine::{KernelHashEngine, KernelRule, SearchState, StakeHit};
use crate::error::{KernelError, Result};
use crate::external::{ActivationSource, ParameterId};

/// Announced by the node when a new tip connects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TipUpdate {
    pub height: u32,
    /// Compact target for the next block.
    pub bits: u32,
}

/// A kernel hit ready to be turned into a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoundStake {
    pub candidate: StakeCandidate,
    /// Block the new block builds on.
    pub prev: BlockHash,
    /// Height of the new block.
    pub height: u32,
    pub hit: StakeHit,
}

/// Wall-clock source, in seconds since the Unix epoch.
pub type TimeSource = Arc<dyn Fn() -> i64 + Send + Sync>;

/// The system clock.
pub fn system_time() -> TimeSource {
    Arc::new(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    })
}

/// Searches a set of coins against the current tip.
pub struct Staker<C: ChainView + 'static> {
    chain: Arc<C>,
    config: KernelConfig,
    activation: Arc<dyn ActivationSource>,
    clock: TimeSource,
    candidates: Vec<StakeCandidate>,
    states: HashMap<OutPoint, SearchState>,
}

impl<C: ChainView + 'static> Staker<C> {
    pub fn new(chain: Arc<C>, config: KernelConfig) -> Self {
        let activation = Arc::new(config.activation());
        Self {
            chain,
            config,
            activation,
            clock: system_time(),
            candidates: Vec::new(),
            states: HashMap::new(),
        }
    }

    pub fn with_activation(mut self, activation: Arc<dyn ActivationSource>) -> Self {
        self.activation = activation;
        self
    }

    pub fn with_clock(mut self, clock: TimeSource) -> Self {
        self.clock = clock;
        self
    }

    pub fn add_candidate(&mut self, candidate: StakeCandidate) {
        if !self.candidates.iter().any(|c| c.prevout == candidate.prevout) {
            self.candidates.push(candidate);
        }
    }

    pub fn remove_candidate(&mut self, prevout: &OutPoint) {
        self.candidates.retain(|c| c.prevout != *prevout);
        self.states.remove(prevout);
    }

    pub fn candidates(&self) -> &[StakeCandidate] {
        &self.candidates
    }

    /// Run until the tip channel closes.
    ///
    /// A search round runs on each tip change and on every poll tick.
    /// Returns an error only for consistency faults or a dropped receiver.
    pub async fn run(
        mut self,
        mut tips: watch::Receiver<Option<TipUpdate>>,
        found: mpsc::Sender<FoundStake>,
    ) -> Result<()> {
        let mut ticker = tokio::time::interval(self.config.poll_interval());
        info!(candidates = self.candidates.len(), "staker started");

        loop {
            tokio::select! {
                changed = tips.changed() => {
                    if changed.is_err() {
                        info!("tip channel closed; staker stopping");
                        return Ok(());
                    }
                }
                _ = ticker.tick() => {}
            }

            let update = *tips.borrow_and_update();
            let Some(update) = update else {
                continue;
            };

            if let Some(stake) = self.search_round(update).await? {
                info!(
                    height = stake.height,
                    time = stake.hit.time,
                    prevout = %stake.candidate.prevout,
                    "found stake"
                );
                found
                    .send(stake)
                    .await
                    .map_err(|_| KernelError::StakerStopped("found-stake receiver dropped".into()))?;
            }
        }
    }

    async fn search_round(&mut self, update: TipUpdate) -> Result<Option<FoundStake>> {
        let chain = Arc::clone(&self.chain);
        let activation = Arc::clone(&self.activation);
        let params = self.config.params.clone();
        let candidates = self.candidates.clone();
        let mut states = std::mem::take(&mut self.states);
        let now = (self.clock)();

        let joined = tokio::task::spawn_blocking(move || {
            let result = search_candidates(
                &*chain,
                &params,
                &*activation,
                &candidates,
                &mut states,
                now,
                update,
            );
            (result, states)
        })
        .await;

        let (result, states) =
            joined.map_err(|e| KernelError::StakerStopped(format!("search task failed: {e}")))?;
        self.states = states;
        result
    }
}

/// One pass over all candidates against the current tip.
///
/// Coins that are too young or whose modifier is not yet fixed are skipped.
pub fn search_candidates<C, A>(
    chain: &C,
    params: &NetworkParams,
    activation: &A,
    candidates: &[StakeCandidate],
    states: &mut HashMap<OutPoint, SearchState>,
    now: i64,
    update: TipUpdate,
) -> Result<Option<FoundStake>>
where
    C: ChainView + ?Sized,
    A: ActivationSource + ?Sized,
{
    let Some(tip) = chain.tip() else {
        return Ok(None);
    };
    if tip.height != update.height {
        debug!(tip = tip.height, announced = update.height, "stale tip update");
        return Ok(None);
    }

    let height = tip.height + 1;
    let rule = if height >= activation.activation_height(ParameterId::StakingProtocolV2) {
        KernelRule::V2
    } else {
        KernelRule::V1
    };

    let engine = KernelHashEngine::new(chain, params);
    for candidate in candidates {
        let state = states.entry(candidate.prevout).or_default();
        let searched = match rule {
            KernelRule::V2 => engine.search_v2(&tip, candidate, now, update.bits, state),
            KernelRule::V1 => engine.search_v1(candidate, now, update.bits, state),
        };

        match searched {
            Ok(Some(hit)) => {
                return Ok(Some(FoundStake {
                    candidate: *candidate,
                    prev: tip.hash,
                    height,
                    hit,
                }))
            }
            Ok(None) => {}
            Err(KernelError::Stake(reason)) => {
                trace!(prevout = %candidate.prevout, %reason, "candidate not eligible");
            }
            Err(KernelError::Chain(ChainError::ModifierNotYetDeterminable { .. })) => {
                trace!(prevout = %candidate.prevout, "modifier not yet determinable");
            }
            Err(e) if e.is_consistency_fault() => return Err(e),
            Err(e) => warn!(prevout = %candidate.prevout, error = %e, "candidate search failed"),
        }
    }

    Ok(None)
}
