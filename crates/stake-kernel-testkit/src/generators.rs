//! Proptest generators for property-based testing.

use proptest::prelude::*;

use stake_kernel_core::{
    Amount, BlockHash, Hash256, KernelInput, NetworkParams, OutPoint, StakeCandidate, Timestamp,
    TxId,
};

/// Generate a random 256-bit value.
pub fn hash256() -> impl Strategy<Value = Hash256> {
    any::<[u8; 32]>().prop_map(Hash256::from_bytes)
}

/// Generate a random block hash.
pub fn block_hash() -> impl Strategy<Value = BlockHash> {
    any::<[u8; 32]>().prop_map(BlockHash::from_bytes)
}

/// Generate a random outpoint (never null).
pub fn outpoint() -> impl Strategy<Value = OutPoint> {
    (any::<[u8; 32]>(), 0u32..16).prop_map(|(txid, index)| OutPoint::new(TxId::from_bytes(txid), index))
}

/// Generate a stake value between one unit and 21 million coins.
pub fn stake_value() -> impl Strategy<Value = Amount> {
    1i64..=2_100_000_000_000_000i64
}

/// Generate a plausible block timestamp.
pub fn block_time() -> impl Strategy<Value = Timestamp> {
    1_400_000_000u32..=2_000_000_000u32
}

/// Generate a compact target that decodes without error.
pub fn compact_bits() -> impl Strategy<Value = u32> {
    (3u32..=0x20, 0x0001u32..=0x7fffff).prop_map(|(exponent, mantissa)| (exponent << 24) | mantissa)
}

/// Generate a kernel input whose time is at or after its source time.
pub fn kernel_input() -> impl Strategy<Value = KernelInput> {
    (block_time(), outpoint(), 0u32..1_000_000).prop_map(|(from, prevout, age)| KernelInput {
        block_from_time: from,
        prevout,
        time_tx: from.saturating_add(age),
    })
}

/// Generate a coin with a random source block.
pub fn stake_candidate() -> impl Strategy<Value = StakeCandidate> {
    (stake_value(), outpoint(), block_hash(), block_time()).prop_map(
        |(value, prevout, block_from, block_from_time)| StakeCandidate {
            value,
            prevout,
            block_from,
            block_from_time,
        },
    )
}

/// Generate a valid parameter set with a random modifier interval.
pub fn network_params() -> impl Strategy<Value = NetworkParams> {
    (1u32..=3_600, 1u32..=5).prop_map(|(interval, ratio)| {
        NetworkParams::builder()
            .modifier_interval(interval)
            .modifier_interval_ratio(ratio)
            .build()
            .unwrap_or_default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use stake_kernel_core::{
        check_kernel_preconditions, is_time_eligible, kernel_hash_v2, stake_target_hit,
        HashAlgorithm, Target,
    };

    proptest! {
        #[test]
        fn test_compact_bits_decode(bits in compact_bits()) {
            prop_assert!(Target::from_compact(bits).is_ok());
        }

        #[test]
        fn test_kernel_hash_deterministic(input in kernel_input(), modifier in hash256()) {
            let a = kernel_hash_v2(HashAlgorithm::Sha256d, &modifier, &input);
            let b = kernel_hash_v2(HashAlgorithm::Sha256d, &modifier, &input);
            prop_assert_eq!(a, b);
        }

        #[test]
        fn test_time_eligibility_matches_preconditions(
            coin in stake_candidate(),
            offset in 0u32..20_000,
        ) {
            let params = NetworkParams::mainnet();
            let time_tx = coin.block_from_time.saturating_add(offset);
            let checked = check_kernel_preconditions(&params, coin.value, coin.block_from_time, time_tx);
            prop_assert_eq!(
                is_time_eligible(&params, coin.block_from_time, i64::from(time_tx)),
                checked.is_ok()
            );
        }

        #[test]
        fn test_last_section_is_full_interval(params in network_params()) {
            prop_assert_eq!(
                params.selection_interval_section(63).unwrap(),
                i64::from(params.modifier_interval)
            );
        }

        #[test]
        fn test_sections_non_decreasing(params in network_params()) {
            for section in 1..64 {
                prop_assert!(
                    params.selection_interval_section(section).unwrap()
                        >= params.selection_interval_section(section - 1).unwrap()
                );
            }
        }

        #[test]
        fn test_target_hit_monotonic_in_value(
            hash in hash256(),
            value in stake_value(),
            extra in 0i64..1_000_000_000,
            bits in compact_bits(),
        ) {
            let target = Target::from_compact(bits).unwrap();
            if stake_target_hit(&hash, value, &target) {
                prop_assert!(stake_target_hit(&hash, value + extra, &target));
            }
        }
    }
}
