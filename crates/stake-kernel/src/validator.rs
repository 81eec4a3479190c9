//! Proof-of-stake block validation.
//!
//! Resolves the coin a coinstake spends, checks its signature, locates the
//! block that created it, then verifies the kernel under whichever rule is
//! active at the new height.

use serde::{Deserialize, Serialize};
use stake_kernel_chain::{ChainPosition, ChainView, TransactionStore};
use stake_kernel_core::{Block, Hash256, NetworkParams, StakeCandidate};
use tracing::{debug, error, info};

use crate::engine::{KernelHashEngine, KernelRule};
use crate::error::{KernelError, Result};
use crate::external::{ActivationSource, ParameterId, ScriptFlags, ScriptVerifier, SignatureContext};

/// An accepted proof of stake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofOfStake {
    pub hash_proof_of_stake: Hash256,
    pub rule: KernelRule,
}

/// Validates stake blocks against chain, storage and script services.
pub struct ProofOfStakeValidator<'a, C, S, V, A>
where
    C: ChainView + ?Sized,
    S: TransactionStore + ?Sized,
    V: ScriptVerifier + ?Sized,
    A: ActivationSource + ?Sized,
{
    chain: &'a C,
    store: &'a S,
    scripts: &'a V,
    activation: &'a A,
    params: &'a NetworkParams,
}

impl<'a, C, S, V, A> ProofOfStakeValidator<'a, C, S, V, A>
where
    C: ChainView + ?Sized,
    S: TransactionStore + ?Sized,
    V: ScriptVerifier + ?Sized,
    A: ActivationSource + ?Sized,
{
    pub fn new(
        chain: &'a C,
        store: &'a S,
        scripts: &'a V,
        activation: &'a A,
        params: &'a NetworkParams,
    ) -> Self {
        Self {
            chain,
            store,
            scripts,
            activation,
            params,
        }
    }

    /// Kernel rule for a block at `height`.
    pub fn rule_at(&self, height: u32) -> KernelRule {
        if height >= self.activation.activation_height(ParameterId::StakingProtocolV2) {
            KernelRule::V2
        } else {
            KernelRule::V1
        }
    }

    /// Check the proof of stake of `block`, which builds on `prev`.
    pub fn check_proof_of_stake(&self, block: &Block, prev: &ChainPosition) -> Result<ProofOfStake> {
        let result = self.check(block, prev);
        match &result {
            Ok(proof) => debug!(
                block = %block.header.hash,
                rule = ?proof.rule,
                hash = %proof.hash_proof_of_stake,
                "proof of stake accepted"
            ),
            Err(e) if e.is_consistency_fault() => {
                error!(block = %block.header.hash, error = %e, "proof of stake check hit inconsistent chain data")
            }
            Err(e) => info!(block = %block.header.hash, error = %e, "proof of stake rejected"),
        }
        result
    }

    fn check(&self, block: &Block, prev: &ChainPosition) -> Result<ProofOfStake> {
        let coinstake = match block.coinstake() {
            Some(tx) if block.is_proof_of_stake() => tx,
            _ => return Err(KernelError::NotCoinstake(block.header.hash)),
        };
        let txin = &coinstake.inputs[0];

        let (prev_tx, containing_block) = self
            .store
            .lookup_transaction(&txin.prevout.txid)
            .ok_or(KernelError::CoinNotFound(txin.prevout))?;
        let spent = prev_tx
            .output(txin.prevout.index)
            .ok_or(KernelError::CoinNotFound(txin.prevout))?;

        let context = SignatureContext {
            transaction: coinstake,
            input_index: 0,
        };
        if !self.scripts.verify_script(
            &txin.script_sig,
            &spent.script_pubkey,
            ScriptFlags::STANDARD,
            &context,
        ) {
            return Err(KernelError::ScriptFailed(coinstake.txid));
        }

        let from = self
            .chain
            .position_by_hash(&containing_block)
            .ok_or(KernelError::SourceBlockNotFound(containing_block))?;
        let header = self
            .store
            .read_block_header(&from)
            .ok_or(KernelError::SourceBlockNotFound(containing_block))?;

        if txin.prevout.txid != prev_tx.txid {
            return Err(KernelError::TxIdMismatch {
                expected: txin.prevout.txid,
                found: prev_tx.txid,
            });
        }

        let candidate = StakeCandidate {
            value: spent.value,
            prevout: txin.prevout,
            block_from: header.hash,
            block_from_time: header.time,
        };

        let engine = KernelHashEngine::new(self.chain, self.params);
        let time = block.header.time;
        let bits = block.header.bits;
        let rule = self.rule_at(prev.height + 1);
        let hash_proof_of_stake = match rule {
            KernelRule::V2 => engine.check_v2(prev, &candidate, time, bits)?,
            KernelRule::V1 => engine.check_v1(&candidate, time, bits)?,
        };

        Ok(ProofOfStake {
            hash_proof_of_stake,
            rule,
        })
    }
}
