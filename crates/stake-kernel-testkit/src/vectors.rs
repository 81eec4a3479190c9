//! Golden kernel-hash vectors.
//!
//! Expected hashes are double SHA-256 over the documented layouts, computed
//! outside this code base. Any node must reproduce them byte for byte.

use serde::{Deserialize, Serialize};
use stake_kernel_core::{
    checksum_hash, kernel_hash_v1, kernel_hash_v2, modifier_v2_hash, selection_hash, BlockHash,
    Hash256, HashAlgorithm, KernelInput, OutPoint, TxId, FIRST_BLOCK_STAKE_MODIFIER,
};

/// Which layout a vector exercises.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum VectorModifier {
    V1 { modifier: u64 },
    V2 { modifier_v2: String },
}

/// A kernel hash test vector. All 256-bit values are hex in serialization order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelVector {
    pub name: String,
    #[serde(flatten)]
    pub modifier: VectorModifier,
    pub block_from_time: u32,
    pub txid: String,
    pub index: u32,
    pub time_tx: u32,
    pub expected_hash: String,
}

impl KernelVector {
    pub fn input(&self) -> KernelInput {
        KernelInput {
            block_from_time: self.block_from_time,
            prevout: OutPoint::new(TxId(parse(&self.txid)), self.index),
            time_tx: self.time_tx,
        }
    }

    /// Hash this vector's input with double SHA-256.
    pub fn compute(&self) -> Hash256 {
        let input = self.input();
        match &self.modifier {
            VectorModifier::V1 { modifier } => kernel_hash_v1(HashAlgorithm::Sha256d, *modifier, &input),
            VectorModifier::V2 { modifier_v2 } => {
                kernel_hash_v2(HashAlgorithm::Sha256d, &parse(modifier_v2), &input)
            }
        }
    }
}

fn parse(hex_str: &str) -> Hash256 {
    Hash256::from_hex(hex_str).unwrap_or_else(|e| panic!("bad vector hex {hex_str:?}: {e}"))
}

fn ascending() -> String {
    hex::encode((0u8..32).collect::<Vec<_>>())
}

fn descending() -> String {
    hex::encode((0u8..32).rev().collect::<Vec<_>>())
}

/// All kernel vectors.
pub fn all_vectors() -> Vec<KernelVector> {
    vec![
        KernelVector {
            name: "v1 patterned fields".into(),
            modifier: VectorModifier::V1 {
                modifier: 0x0102030405060708,
            },
            block_from_time: 0x11223344,
            txid: "ab".repeat(32),
            index: 5,
            time_tx: 0x55667788,
            expected_hash: "b334d00cb67e282b36888d5cc339a8ae308e268dfbb310957d78e5f244c13ab0".into(),
        },
        KernelVector {
            name: "v1 first-block modifier".into(),
            modifier: VectorModifier::V1 {
                modifier: FIRST_BLOCK_STAKE_MODIFIER,
            },
            block_from_time: 1_600_000_000,
            txid: ascending(),
            index: 0,
            time_tx: 1_600_003_600,
            expected_hash: "dcfe2b54644072012baa3c0216ebe31f596d09fb3e45f0be2b479f94a6a8b655".into(),
        },
        KernelVector {
            name: "v1 all zero".into(),
            modifier: VectorModifier::V1 { modifier: 0 },
            block_from_time: 0,
            txid: "00".repeat(32),
            index: 0,
            time_tx: 0,
            expected_hash: "a2fcf96babc27f6c7f411942179ae4618f78c6e01c2d804e6995a1c22849152a".into(),
        },
        KernelVector {
            name: "v2 patterned fields".into(),
            modifier: VectorModifier::V2 {
                modifier_v2: "cd".repeat(32),
            },
            block_from_time: 0x11223344,
            txid: "ab".repeat(32),
            index: 5,
            time_tx: 0x55667788,
            expected_hash: "11efb71437ba8da9a94f378b6420598649d752eddf2f1eb16b8af4134bf133b7".into(),
        },
        KernelVector {
            name: "v2 one hour after source".into(),
            modifier: VectorModifier::V2 {
                modifier_v2: descending(),
            },
            block_from_time: 1_600_000_000,
            txid: ascending(),
            index: 1,
            time_tx: 1_600_003_600,
            expected_hash: "48bfff18bd867d4120eef770c85f7d09abd3a4d085d506b300b1513aa55fa340".into(),
        },
        KernelVector {
            name: "v2 all zero".into(),
            modifier: VectorModifier::V2 {
                modifier_v2: "00".repeat(32),
            },
            block_from_time: 0,
            txid: "00".repeat(32),
            index: 0,
            time_tx: 0,
            expected_hash: "7f2b55926b44c1137c38dd0e21a60ab5cc8f9041c52c53ab4d065872ddaa1d1b".into(),
        },
    ]
}

/// Selection hash of block `5a…5a` under the first-block modifier.
pub const SELECTION_VECTOR: &str = "62bbcee5ebebe84e6bcc6996a334d8615200a773da6c244f2bfddfac6752fcbd";

/// V2 modifier hash with kernel `01…01` over previous modifier `02…02`.
pub const MODIFIER_V2_VECTOR: &str = "39ce20bede82c96b8908bec4a157b09c549b3db90b9b474bda9ae9b9030310b4";

/// Checksum of a genesis-like position: no previous checksum, flags 0x4,
/// zero proof hash, zero modifier.
pub const CHECKSUM_VECTOR: u32 = 0xfd11f4e7;

/// Same inputs chained onto a previous checksum of zero.
pub const CHAINED_CHECKSUM_VECTOR: u32 = 0x8103ead4;

/// Run every vector, reporting `(name, matches, computed_hex)`.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    let mut results: Vec<(String, bool, String)> = all_vectors()
        .iter()
        .map(|v| {
            let hex = v.compute().to_hex();
            (v.name.clone(), hex == v.expected_hash, hex)
        })
        .collect();

    let selection = selection_hash(
        HashAlgorithm::Sha256d,
        &BlockHash::from_bytes([0x5a; 32]),
        FIRST_BLOCK_STAKE_MODIFIER,
    )
    .to_hex();
    results.push(("selection".into(), selection == SELECTION_VECTOR, selection));

    let modifier_v2 = modifier_v2_hash(
        HashAlgorithm::Sha256d,
        &Hash256::from_bytes([1; 32]),
        &Hash256::from_bytes([2; 32]),
    )
    .to_hex();
    results.push(("modifier v2".into(), modifier_v2 == MODIFIER_V2_VECTOR, modifier_v2));

    for (name, prev, expected) in [
        ("checksum", None, CHECKSUM_VECTOR),
        ("chained checksum", Some(0), CHAINED_CHECKSUM_VECTOR),
    ] {
        let checksum = checksum_hash(HashAlgorithm::Sha256d, prev, 0x4, &Hash256::ZERO, 0)
            .shr(224)
            .low_u64() as u32;
        results.push((name.into(), checksum == expected, format!("{checksum:#010x}")));
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_vectors_match() {
        for (name, matches, computed) in verify_all_vectors() {
            assert!(matches, "vector '{}' computed {}", name, computed);
        }
    }

    #[test]
    fn test_vectors_json_roundtrip() {
        let json = serde_json::to_string_pretty(&all_vectors()).unwrap();
        let parsed: Vec<KernelVector> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, all_vectors());
        assert!(json.contains("\"rule\": \"v2\""));
    }

    #[test]
    fn test_vector_file_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kernel_vectors.json");
        std::fs::write(&path, serde_json::to_vec(&all_vectors()).unwrap()).unwrap();

        let loaded: Vec<KernelVector> =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        for vector in loaded {
            assert_eq!(vector.compute().to_hex(), vector.expected_hash, "{}", vector.name);
        }
    }
}
