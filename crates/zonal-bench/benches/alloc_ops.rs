//! Criterion micro-benchmarks for word allocation: size-class arena vs system heap.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use zonal_alloc::{AllocConfig, SizeClassAllocator, SystemWordAllocator};
use zonal_bench::{generate_trace, replay_words, search_profile, steady_profile};

const SEED: u64 = 0x2a;

fn arena() -> SizeClassAllocator {
    SizeClassAllocator::new(AllocConfig::new().with_chunk_words(1 << 16)).unwrap()
}

/// Benchmark: 10K-op search trace on a cold allocator (includes chunk growth).
fn bench_search_trace_cold(c: &mut Criterion) {
    let trace = generate_trace(&search_profile(10_000), SEED);
    let mut group = c.benchmark_group("search_trace_cold");
    group.bench_function("arena", |b| {
        b.iter_batched(
            arena,
            |mut a| black_box(replay_words(&mut a, &trace)),
            BatchSize::SmallInput,
        );
    });
    group.bench_function("system", |b| {
        b.iter_batched(
            SystemWordAllocator::new,
            |mut a| black_box(replay_words(&mut a, &trace)),
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

/// Benchmark: steady churn on a warm allocator (free lists already populated).
fn bench_steady_churn_warm(c: &mut Criterion) {
    let trace = generate_trace(&steady_profile(10_000), SEED);
    let mut group = c.benchmark_group("steady_churn_warm");

    let mut a = arena();
    replay_words(&mut a, &trace);
    group.bench_function("arena", |b| {
        b.iter(|| black_box(replay_words(&mut a, &trace)));
    });

    let mut s = SystemWordAllocator::new();
    group.bench_function("system", |b| {
        b.iter(|| black_box(replay_words(&mut s, &trace)));
    });
    group.finish();
}

/// Benchmark: one allocate + deallocate pair served from a free list.
fn bench_reuse_pair(c: &mut Criterion) {
    let mut a = arena();
    let h = a.allocate(25).unwrap();
    a.deallocate(h, 25);
    c.bench_function("arena_reuse_pair_25w", |b| {
        b.iter(|| {
            let h = a.allocate(black_box(25)).unwrap();
            a.deallocate(h, 25);
        });
    });
}

/// Benchmark: bulk release of a 64-chunk arena.
fn bench_reset(c: &mut Criterion) {
    c.bench_function("arena_reset_64_chunks", |b| {
        b.iter_batched(
            || {
                let mut a = SizeClassAllocator::new(AllocConfig::new().with_chunk_words(1024))
                    .unwrap();
                for _ in 0..64 {
                    a.allocate(1024).unwrap();
                }
                a
            },
            |mut a| {
                a.reset();
                black_box(a.chunk_count())
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_search_trace_cold,
    bench_steady_churn_warm,
    bench_reuse_pair,
    bench_reset
);
criterion_main!(benches);
