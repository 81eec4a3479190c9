//! Test fixtures and helpers.
//!
//! Builds small chains with funded coins and signed coinstakes, so
//! integration tests can drive the validator and the staker end to end.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;

use stake_kernel::{ScriptFlags, ScriptVerifier, SignatureContext};
use stake_kernel_chain::{BlockMeta, ChainIndex, ChainPosition, ChainView, MemoryTransactionStore};
use stake_kernel_core::{
    Amount, Block, BlockHash, BlockHeader, Hash256, HashAlgorithm, NetworkParams, OutPoint,
    StakeCandidate, Timestamp, Transaction, TxId, TxIn, TxOut,
};

/// Compact target every positive-value coin hits.
pub const EASY_BITS: u32 = 0x2100ffff;

/// Compact target that decodes to zero: nothing hits.
pub const IMPOSSIBLE_BITS: u32 = 0x0000_0000;

/// Message a coinstake input signs: `txid ‖ input_index`.
pub fn signature_message(context: &SignatureContext<'_>) -> Hash256 {
    HashAlgorithm::Sha256d
        .writer()
        .hash256(context.transaction.txid.as_hash())
        .u32(context.input_index as u32)
        .finish()
}

/// A staking key. Its locking script is the raw 32-byte public key.
pub struct StakerKey {
    signing: SigningKey,
}

impl StakerKey {
    pub fn generate() -> Self {
        Self {
            signing: SigningKey::generate(&mut OsRng),
        }
    }

    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            signing: SigningKey::from_bytes(&seed),
        }
    }

    pub fn lock_script(&self) -> Vec<u8> {
        self.signing.verifying_key().to_bytes().to_vec()
    }

    /// Unlocking script for input `input_index` of `tx`.
    pub fn sign_input(&self, tx: &Transaction, input_index: usize) -> Vec<u8> {
        let context = SignatureContext {
            transaction: tx,
            input_index,
        };
        let message = signature_message(&context);
        self.signing.sign(message.as_bytes()).to_bytes().to_vec()
    }
}

/// Ed25519 script checker: the lock is a public key, the unlock a signature.
#[derive(Debug, Default, Clone, Copy)]
pub struct TestScriptVerifier;

impl ScriptVerifier for TestScriptVerifier {
    fn verify_script(
        &self,
        script_sig: &[u8],
        script_pubkey: &[u8],
        _flags: ScriptFlags,
        context: &SignatureContext<'_>,
    ) -> bool {
        let Ok(key_bytes) = <[u8; 32]>::try_from(script_pubkey) else {
            return false;
        };
        let Ok(key) = VerifyingKey::from_bytes(&key_bytes) else {
            return false;
        };
        let Ok(signature) = Signature::from_slice(script_sig) else {
            return false;
        };
        key.verify(signature_message(context).as_bytes(), &signature)
            .is_ok()
    }
}

/// Accepts every script.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAllScripts;

impl ScriptVerifier for AcceptAllScripts {
    fn verify_script(&self, _: &[u8], _: &[u8], _: ScriptFlags, _: &SignatureContext<'_>) -> bool {
        true
    }
}

/// Deterministic identifier derived from a label and a counter.
pub fn derive_hash(label: &str, n: u64) -> Hash256 {
    let mut data = label.as_bytes().to_vec();
    data.extend_from_slice(&n.to_le_bytes());
    HashAlgorithm::Sha256d.hash(&data)
}

/// Builds an active chain plus matching transaction storage.
pub struct ChainBuilder {
    chain: ChainIndex,
    store: MemoryTransactionStore,
    next_time: Timestamp,
    spacing: u32,
    tx_counter: u64,
}

impl ChainBuilder {
    /// Start with a genesis block at `genesis_time`.
    pub fn new(params: NetworkParams, genesis_time: Timestamp, spacing: u32) -> Self {
        let mut builder = Self {
            chain: ChainIndex::new(params),
            store: MemoryTransactionStore::new(),
            next_time: genesis_time,
            spacing,
            tx_counter: 0,
        };
        builder.push_block(Vec::new());
        builder
    }

    pub fn chain(&self) -> &ChainIndex {
        &self.chain
    }

    pub fn store(&self) -> &MemoryTransactionStore {
        &self.store
    }

    pub fn tip(&self) -> ChainPosition {
        self.chain
            .tip()
            .unwrap_or_else(|| panic!("builder always holds genesis"))
    }

    /// Time the next block will carry.
    pub fn next_time(&self) -> Timestamp {
        self.next_time
    }

    /// Append `count` empty work blocks.
    pub fn work_blocks(&mut self, count: u32) -> ChainPosition {
        for _ in 0..count {
            self.push_block(Vec::new());
        }
        self.tip()
    }

    /// Append a work block paying `value` to `lock_script`. Returns the coin.
    pub fn fund(&mut self, value: Amount, lock_script: Vec<u8>) -> StakeCandidate {
        self.tx_counter += 1;
        let tx = Transaction {
            txid: TxId(derive_hash("fund", self.tx_counter)),
            inputs: vec![TxIn {
                prevout: OutPoint::new(TxId(derive_hash("source", self.tx_counter)), 0),
                script_sig: Vec::new(),
            }],
            outputs: vec![TxOut {
                value,
                script_pubkey: lock_script,
            }],
        };
        let prevout = OutPoint::new(tx.txid, 0);
        let position = self.push_block(vec![tx]);
        StakeCandidate {
            value,
            prevout,
            block_from: position.hash,
            block_from_time: position.time,
        }
    }

    fn push_block(&mut self, mut transactions: Vec<Transaction>) -> ChainPosition {
        let height = self.chain.len() as u64;
        let hash = BlockHash(derive_hash("block", height));
        let prev_hash = self.chain.tip().map_or(BlockHash::ZERO, |tip| tip.hash);
        let time = self.next_time;

        let coinbase = Transaction {
            txid: TxId(derive_hash("coinbase", height)),
            inputs: vec![TxIn {
                prevout: OutPoint::NULL,
                script_sig: Vec::new(),
            }],
            outputs: vec![TxOut {
                value: 0,
                script_pubkey: vec![0x51],
            }],
        };
        transactions.insert(0, coinbase);

        let position = self
            .chain
            .connect_block(BlockMeta::work(hash, prev_hash, time))
            .unwrap_or_else(|e| panic!("fixture block failed to connect: {e}"));
        self.store.insert_block(&Block {
            header: BlockHeader {
                hash,
                prev_hash,
                time,
                bits: EASY_BITS,
            },
            transactions,
        });

        self.next_time += self.spacing;
        position
    }

    pub fn build(self) -> (ChainIndex, MemoryTransactionStore) {
        (self.chain, self.store)
    }
}

/// An unsigned coinstake spending `prevout`.
pub fn coinstake(prevout: OutPoint, value: Amount, lock_script: Vec<u8>) -> Transaction {
    Transaction {
        txid: TxId(derive_hash("coinstake", prevout.index as u64 ^ prevout.txid.as_hash().low_u64())),
        inputs: vec![TxIn {
            prevout,
            script_sig: Vec::new(),
        }],
        outputs: vec![
            TxOut::empty(),
            TxOut {
                value,
                script_pubkey: lock_script,
            },
        ],
    }
}

/// A stake block on `prev` whose coinstake spends `coin`, signed by `key`.
pub fn stake_block(
    prev: &ChainPosition,
    coin: &StakeCandidate,
    key: &StakerKey,
    time: Timestamp,
    bits: u32,
) -> Block {
    let mut stake = coinstake(coin.prevout, coin.value, key.lock_script());
    stake.inputs[0].script_sig = key.sign_input(&stake, 0);

    let coinbase = Transaction {
        txid: TxId(derive_hash("stake-coinbase", u64::from(prev.height) + 1)),
        inputs: vec![TxIn {
            prevout: OutPoint::NULL,
            script_sig: Vec::new(),
        }],
        outputs: vec![TxOut::empty()],
    };

    Block {
        header: BlockHeader {
            hash: BlockHash(derive_hash("stake-block", u64::from(prev.height) + 1)),
            prev_hash: prev.hash,
            time,
            bits,
        },
        transactions: vec![coinbase, stake],
    }
}
