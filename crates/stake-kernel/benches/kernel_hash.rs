use criterion::{black_box, criterion_group, criterion_main, Criterion};
use stake_kernel::core::{kernel_hash_v1, kernel_hash_v2, HashAlgorithm, KernelInput, OutPoint};
use stake_kernel::{hash_and_compare, Hash256, NetworkParams, StakeModifier, Target, TxId};

fn input() -> KernelInput {
    KernelInput {
        block_from_time: 1_600_000_000,
        prevout: OutPoint::new(TxId::from_bytes([0x5a; 32]), 1),
        time_tx: 1_600_090_000,
    }
}

fn bench_kernel_hash(c: &mut Criterion) {
    let input = input();
    let modifier_v2 = Hash256::from_bytes([0x77; 32]);

    for algorithm in [HashAlgorithm::Sha256d, HashAlgorithm::Blake3] {
        c.bench_function(&format!("kernel_hash_v1/{algorithm:?}"), |b| {
            b.iter(|| kernel_hash_v1(algorithm, black_box(0x0123_4567_89ab_cdef), black_box(&input)))
        });
        c.bench_function(&format!("kernel_hash_v2/{algorithm:?}"), |b| {
            b.iter(|| kernel_hash_v2(algorithm, black_box(&modifier_v2), black_box(&input)))
        });
    }
}

fn bench_hash_and_compare(c: &mut Criterion) {
    let params = NetworkParams::mainnet();
    let target = Target::from_compact(0x1d00ffff).unwrap();
    let modifier = StakeModifier::V2(Hash256::from_bytes([0x77; 32]));
    let mut input = input();

    // One probe of a V2 search: a new timestamp each iteration.
    c.bench_function("hash_and_compare/v2_probe", |b| {
        b.iter(|| {
            input.time_tx = input.time_tx.wrapping_add(params.stake_interval);
            hash_and_compare(&params, &modifier, black_box(&input), 100_000_000, &target)
        })
    });
}

criterion_group!(benches, bench_kernel_hash, bench_hash_and_compare);
criterion_main!(benches);
