//! Counting and decoding benchmarks.
//!
//! Compares memoized index arithmetic against the reference counter, which materializes every
//! topology through the literal base-m codec.
//!
//! Run with:
//! ```bash
//! cargo bench --bench counting
//! ```

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gourgs_enum::{create_seeds, CountingMode, Enumerator, EnumeratorConfig, PrimitiveSet};
use num_bigint::BigUint;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

fn arith() -> PrimitiveSet {
    let mut pset = PrimitiveSet::new();
    pset.add_operator("add", 2).unwrap();
    pset.add_operator("sub", 1).unwrap();
    pset.add_operator("truediv", 3).unwrap();
    pset.add_operator("mul", 1).unwrap();
    pset.add_variable("x").unwrap();
    pset.add_variable("y").unwrap();
    pset
}

/// Deterministic random complexity indices below `max`.
fn random_indices(seed: u64, count: usize, max: u64) -> Vec<u64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count).map(|_| rng.random_range(0..max)).collect()
}

// ============================================================================
// Benchmark: R(i) and S(i), memoized vs reference
// ============================================================================

fn bench_counts(c: &mut Criterion) {
    let mut group = c.benchmark_group("counting/r_s");

    for max in [1_000u64, 100_000, 10_000_000] {
        let indices = random_indices(42, 256, max);
        group.throughput(Throughput::Elements(indices.len() as u64));

        for mode in [CountingMode::Memoized, CountingMode::Reference] {
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", mode), max),
                &indices,
                |b, indices| {
                    b.iter_with_setup(
                        || Enumerator::with_config(arith(), EnumeratorConfig::new(mode)),
                        |enumerator| {
                            for &i in indices {
                                enumerator.calculate_r_i(i).unwrap();
                                enumerator.calculate_s_i(i).unwrap();
                            }
                            enumerator
                        },
                    );
                },
            );
        }
    }

    group.finish();
}

// ============================================================================
// Benchmark: Warm cache (repeated queries on one enumerator)
// ============================================================================

fn bench_warm_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("counting/warm");

    let indices = random_indices(7, 1024, 1_000_000);
    let enumerator = Enumerator::new(arith());
    for &i in &indices {
        enumerator.calculate_r_i(i).unwrap();
    }

    group.throughput(Throughput::Elements(indices.len() as u64));
    group.bench_function("calculate_r_i", |b| {
        b.iter(|| {
            let mut total = BigUint::ZERO;
            for &i in &indices {
                total += enumerator.calculate_r_i(i).unwrap();
            }
            total
        });
    });

    group.finish();
}

// ============================================================================
// Benchmark: Decoding
// ============================================================================

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for max in [1_000u64, 1_000_000] {
        let seeds = create_seeds(3, 128);
        let enumerator = Enumerator::new(arith());
        group.throughput(Throughput::Elements(seeds.len() as u64));
        group.bench_with_input(BenchmarkId::new("random_once", max), &seeds, |b, seeds| {
            b.iter(|| {
                seeds
                    .iter()
                    .map(|&seed| {
                        enumerator
                            .uniform_random_global_search_once(max, seed)
                            .unwrap()
                            .len()
                    })
                    .sum::<usize>()
            });
        });
    }

    let enumerator = Enumerator::new(arith());
    group.bench_function("exhaustive_first_10000", |b| {
        b.iter(|| {
            enumerator
                .exhaustive_global_search(u64::MAX)
                .unwrap()
                .take(10_000)
                .map(|solution| solution.unwrap().len())
                .sum::<usize>()
        });
    });

    group.finish();
}

criterion_group!(benches, bench_counts, bench_warm_cache, bench_decode);
criterion_main!(benches);
