// Benchmarks for the CPU-side cost of a run: planning the workload and
// digesting generated content. Disk time dominates real runs; these keep
// the bookkeeping overhead honest.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rwperf::checksum::Checksum;
use rwperf::plan;
use std::path::PathBuf;

fn bench_plan(c: &mut Criterion) {
    let paths = vec![
        PathBuf::from("/bench/a"),
        PathBuf::from("/bench/b"),
        PathBuf::from("/bench/c"),
        PathBuf::from("/bench/d"),
    ];

    c.bench_function("plan_64mb_of_4kb_to_64kb_files", |b| {
        b.iter(|| {
            plan::build(
                black_box(64 * 1024 * 1024),
                black_box(4 * 1024),
                black_box(64 * 1024),
                black_box(1),
                &paths,
            )
            .unwrap()
        })
    });
}

fn bench_checksum(c: &mut Criterion) {
    let chunk = vec![0xabu8; 4096];

    c.bench_function("digest_1mb_in_4kb_chunks", |b| {
        b.iter(|| {
            let mut checksum = Checksum::new();
            for _ in 0..256 {
                checksum.update(black_box(&chunk));
            }
            checksum.finish()
        })
    });
}

criterion_group!(benches, bench_plan, bench_checksum);
criterion_main!(benches);
