//! End-to-end proof-of-stake validation.

use stake_kernel::chain::{ChainError, ChainPosition, MemoryTransactionStore, TransactionStore};
use stake_kernel::core::{BlockHeader, OutPoint};
use stake_kernel::{
    Block, BlockHash, ChainIndex, ChainView, KernelError, KernelHashEngine, KernelRule, NetworkParams,
    ProofOfStakeValidator, ScriptVerifier, StakeCandidate, StakeCheckError, StaticActivation,
    Transaction, TxId,
};
use stake_kernel_testkit::fixtures::derive_hash;
use stake_kernel_testkit::{
    stake_block, AcceptAllScripts, ChainBuilder, StakerKey, TestScriptVerifier, EASY_BITS,
    IMPOSSIBLE_BITS,
};

const GENESIS_TIME: u32 = 1_000_020;

struct Scenario {
    key: StakerKey,
    coin: StakeCandidate,
    chain: ChainIndex,
    store: MemoryTransactionStore,
    params: NetworkParams,
}

impl Scenario {
    /// A coin funded at height 1, followed by 60 work blocks.
    fn new() -> Self {
        let params = NetworkParams::mainnet();
        let key = StakerKey::from_seed([0x21; 32]);
        let mut builder = ChainBuilder::new(params.clone(), GENESIS_TIME, 60);
        let coin = builder.fund(100_000_000, key.lock_script());
        builder.work_blocks(60);
        let (chain, store) = builder.build();
        Self {
            key,
            coin,
            chain,
            store,
            params,
        }
    }

    fn tip(&self) -> ChainPosition {
        self.chain.tip().unwrap()
    }

    fn stake_time(&self) -> u32 {
        self.coin.block_from_time + self.params.stake_min_age + 20
    }

    fn block(&self, bits: u32) -> Block {
        stake_block(&self.tip(), &self.coin, &self.key, self.stake_time(), bits)
    }

    fn check_with(&self, block: &Block, v2_height: u32) -> stake_kernel::Result<stake_kernel::ProofOfStake> {
        self.check_scripts_with(block, v2_height, &TestScriptVerifier)
    }

    fn check_scripts_with(
        &self,
        block: &Block,
        v2_height: u32,
        scripts: &dyn ScriptVerifier,
    ) -> stake_kernel::Result<stake_kernel::ProofOfStake> {
        let activation = StaticActivation::new(v2_height);
        ProofOfStakeValidator::new(&self.chain, &self.store, scripts, &activation, &self.params)
            .check_proof_of_stake(block, &self.tip())
    }
}

#[test]
fn test_accepts_v2_stake() {
    let scenario = Scenario::new();
    let block = scenario.block(EASY_BITS);
    let proof = scenario.check_with(&block, 0).unwrap();

    assert_eq!(proof.rule, KernelRule::V2);
    let engine = KernelHashEngine::new(&scenario.chain, &scenario.params);
    let expected = engine
        .check_v2(&scenario.tip(), &scenario.coin, scenario.stake_time(), EASY_BITS)
        .unwrap();
    assert_eq!(proof.hash_proof_of_stake, expected);
}

#[test]
fn test_accepts_v1_stake_before_activation() {
    let scenario = Scenario::new();
    let block = scenario.block(EASY_BITS);
    let proof = scenario.check_with(&block, u32::MAX).unwrap();

    assert_eq!(proof.rule, KernelRule::V1);
    let engine = KernelHashEngine::new(&scenario.chain, &scenario.params);
    let expected = engine
        .check_v1(&scenario.coin, scenario.stake_time(), EASY_BITS)
        .unwrap();
    assert_eq!(proof.hash_proof_of_stake, expected);
}

#[test]
fn test_rule_switches_at_activation_height() {
    let scenario = Scenario::new();
    let block = scenario.block(EASY_BITS);
    let next_height = scenario.tip().height + 1;

    assert_eq!(scenario.check_with(&block, next_height).unwrap().rule, KernelRule::V2);
    assert_eq!(scenario.check_with(&block, next_height + 1).unwrap().rule, KernelRule::V1);
}

#[test]
fn test_rejects_block_without_coinstake() {
    let scenario = Scenario::new();
    let mut block = scenario.block(EASY_BITS);
    block.transactions.truncate(1);

    let err = scenario.check_with(&block, 0).unwrap_err();
    assert!(matches!(err, KernelError::NotCoinstake(_)));
}

#[test]
fn test_rejects_unknown_coin() {
    let scenario = Scenario::new();
    let mut coin = scenario.coin;
    coin.prevout = OutPoint::new(TxId(derive_hash("missing", 1)), 0);
    let block = stake_block(&scenario.tip(), &coin, &scenario.key, scenario.stake_time(), EASY_BITS);

    let err = scenario.check_with(&block, 0).unwrap_err();
    assert!(matches!(err, KernelError::CoinNotFound(_)));
    assert!(!err.is_consistency_fault());
}

#[test]
fn test_rejects_unknown_output_index() {
    let scenario = Scenario::new();
    let mut coin = scenario.coin;
    coin.prevout.index = 7;
    let block = stake_block(&scenario.tip(), &coin, &scenario.key, scenario.stake_time(), EASY_BITS);

    let err = scenario.check_with(&block, 0).unwrap_err();
    assert!(matches!(err, KernelError::CoinNotFound(_)));
}

#[test]
fn test_rejects_bad_signature() {
    let scenario = Scenario::new();
    let thief = StakerKey::from_seed([0x99; 32]);
    let block = stake_block(&scenario.tip(), &scenario.coin, &thief, scenario.stake_time(), EASY_BITS);

    let err = scenario.check_with(&block, 0).unwrap_err();
    assert!(matches!(err, KernelError::ScriptFailed(_)));
}

#[test]
fn test_script_check_is_delegated() {
    let scenario = Scenario::new();
    let thief = StakerKey::from_seed([0x99; 32]);
    let block = stake_block(&scenario.tip(), &scenario.coin, &thief, scenario.stake_time(), EASY_BITS);

    // The kernel itself does not depend on who signed.
    let proof = scenario.check_scripts_with(&block, 0, &AcceptAllScripts).unwrap();
    let honest = scenario.check_with(&scenario.block(EASY_BITS), 0).unwrap();
    assert_eq!(proof, honest);
}

#[test]
fn test_rejects_coin_in_unindexed_block() {
    let scenario = Scenario::new();
    let orphan = BlockHash(derive_hash("orphan", 0));
    let tx = Transaction {
        txid: TxId(derive_hash("orphan-tx", 0)),
        inputs: Vec::new(),
        outputs: vec![stake_kernel::core::TxOut {
            value: 100_000_000,
            script_pubkey: scenario.key.lock_script(),
        }],
    };
    scenario.store.insert_transaction(tx.clone(), orphan);

    let coin = StakeCandidate {
        prevout: OutPoint::new(tx.txid, 0),
        block_from: orphan,
        ..scenario.coin
    };
    let block = stake_block(&scenario.tip(), &coin, &scenario.key, scenario.stake_time(), EASY_BITS);

    let err = scenario.check_with(&block, 0).unwrap_err();
    assert!(matches!(err, KernelError::SourceBlockNotFound(hash) if hash == orphan));
}

/// Returns a transaction whose id differs from the one requested.
struct MislabelledStore(MemoryTransactionStore);

impl TransactionStore for MislabelledStore {
    fn lookup_transaction(&self, txid: &TxId) -> Option<(Transaction, BlockHash)> {
        self.0.lookup_transaction(txid).map(|(mut tx, block)| {
            tx.txid = TxId(derive_hash("mislabelled", 0));
            (tx, block)
        })
    }

    fn read_block_header(&self, position: &ChainPosition) -> Option<BlockHeader> {
        self.0.read_block_header(position)
    }
}

#[test]
fn test_rejects_txid_mismatch() {
    let scenario = Scenario::new();
    let block = scenario.block(EASY_BITS);
    let store = MislabelledStore(scenario.store);
    let activation = StaticActivation::new(0);
    let tip = scenario.chain.tip().unwrap();

    let err = ProofOfStakeValidator::new(
        &scenario.chain,
        &store,
        &TestScriptVerifier,
        &activation,
        &scenario.params,
    )
    .check_proof_of_stake(&block, &tip)
    .unwrap_err();
    assert!(matches!(err, KernelError::TxIdMismatch { .. }));
}

#[test]
fn test_rejects_target_miss() {
    let scenario = Scenario::new();
    let block = scenario.block(IMPOSSIBLE_BITS);

    let err = scenario.check_with(&block, 0).unwrap_err();
    assert!(matches!(
        err,
        KernelError::Stake(StakeCheckError::TargetMiss { value: 100_000_000 })
    ));
}

#[test]
fn test_rejects_young_coin() {
    let scenario = Scenario::new();
    let block = stake_block(
        &scenario.tip(),
        &scenario.coin,
        &scenario.key,
        scenario.coin.block_from_time + 60,
        EASY_BITS,
    );

    let err = scenario.check_with(&block, 0).unwrap_err();
    assert!(matches!(
        err,
        KernelError::Stake(StakeCheckError::MinAgeViolation { .. })
    ));
}

#[test]
fn test_v1_modifier_not_yet_determinable() {
    let params = NetworkParams::mainnet();
    let key = StakerKey::from_seed([0x21; 32]);
    let mut builder = ChainBuilder::new(params.clone(), GENESIS_TIME, 60);
    let coin = builder.fund(100_000_000, key.lock_script());
    builder.work_blocks(5);
    let tip = builder.tip();
    let block = stake_block(&tip, &coin, &key, coin.block_from_time + params.stake_min_age, EASY_BITS);
    let (chain, store) = builder.build();

    let activation = StaticActivation::new(u32::MAX);
    let err = ProofOfStakeValidator::new(&chain, &store, &TestScriptVerifier, &activation, &params)
        .check_proof_of_stake(&block, &tip)
        .unwrap_err();
    assert!(matches!(
        err,
        KernelError::Chain(ChainError::ModifierNotYetDeterminable { .. })
    ));
    assert!(!err.is_consistency_fault());
}
