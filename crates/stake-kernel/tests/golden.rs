//! Golden vectors through the engine's hash-and-compare path.
//!
//! The kernel engine must produce exactly the vector hashes, and its
//! target decision must agree with a direct comparison.

use stake_kernel::core::{stake_target_hit, Target};
use stake_kernel::{hash_and_compare, NetworkParams, StakeModifier};
use stake_kernel_testkit::vectors::{all_vectors, verify_all_vectors, VectorModifier};

#[test]
fn test_vectors_match_reference() {
    for (name, matches, computed) in verify_all_vectors() {
        assert!(matches, "vector '{}' computed {}", name, computed);
    }
}

#[test]
fn test_engine_hash_matches_vectors() {
    let params = NetworkParams::mainnet();
    let target = Target::from_compact(0x1d00ffff).unwrap();

    for vector in all_vectors() {
        let modifier = match &vector.modifier {
            VectorModifier::V1 { modifier } => StakeModifier::V1(*modifier),
            VectorModifier::V2 { modifier_v2 } => {
                StakeModifier::V2(stake_kernel::Hash256::from_hex(modifier_v2).unwrap())
            }
        };
        let (hash, hit) = hash_and_compare(&params, &modifier, &vector.input(), 100_000_000, &target);
        assert_eq!(hex::encode(hash.as_bytes()), vector.expected_hash, "{}", vector.name);

        assert_eq!(hit, stake_target_hit(&hash, 100_000_000, &target), "{}", vector.name);
    }
}

