//! Criterion micro-benchmarks for allocate, free, first-fit search, and
//! coalescing.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use tagheap_arena::Heap;
use tagheap_bench::{churn_workload, comb_heap, fragmented_heap};
use tagheap_test_utils::fixtures::run_ops;

/// Benchmark: one allocate + free pair on a 64 KiB heap (split, then
/// right-merge back into the tail).
fn bench_allocate_free_pair(c: &mut Criterion) {
    let mut heap = Heap::with_capacity(65_536).unwrap();
    c.bench_function("allocate_free_pair", |b| {
        b.iter(|| {
            let p = heap.allocate(black_box(32)).unwrap();
            heap.free(p).unwrap();
        });
    });
}

/// Benchmark: 10K-step seeded churn script on a fresh 64 KiB heap.
fn bench_churn_10k(c: &mut Criterion) {
    let ops = churn_workload(42, 10_000, 256);
    c.bench_function("churn_10k", |b| {
        b.iter_batched(
            || Heap::with_capacity(65_536).unwrap(),
            |mut heap| {
                let outcome = run_ops(&mut heap, &ops).unwrap();
                black_box(outcome.failed);
            },
            BatchSize::SmallInput,
        );
    });
}

/// Benchmark: first-fit walk past 1000 too-small holes to the tail.
fn bench_first_fit_depth_1000(c: &mut Criterion) {
    let (mut heap, _kept) = fragmented_heap(65_536, 8, 1_000).unwrap();
    c.bench_function("first_fit_depth_1000", |b| {
        b.iter(|| {
            // Larger than any hole: only the tail fits.
            let p = heap.allocate(black_box(64)).unwrap();
            heap.free(p).unwrap();
        });
    });
}

/// Benchmark: free 1000 equal chunks in an order where every other free
/// merges on both sides.
fn bench_coalesce_1000(c: &mut Criterion) {
    c.bench_function("coalesce_1000", |b| {
        b.iter_batched(
            || comb_heap(65_536, 16, 1_000).unwrap(),
            |(mut heap, payloads)| {
                for p in payloads.iter().step_by(2) {
                    heap.free(*p).unwrap();
                }
                for p in payloads.iter().skip(1).step_by(2) {
                    heap.free(*p).unwrap();
                }
                black_box(heap.stats().free_chunks);
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_allocate_free_pair,
    bench_churn_10k,
    bench_first_fit_depth_1000,
    bench_coalesce_1000
);
criterion_main!(benches);
