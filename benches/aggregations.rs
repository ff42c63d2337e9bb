//! Aggregation benchmarks
//!
//! Measures the pieces that scale with experiment size: the per-cell
//! reducers, table assembly from records, and cell-wise combination of
//! repetitions.
//!
//! Run with: cargo bench --bench aggregations

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use expout_tables::aggregate::{combine, trimmed_mean, CellReducer, Mean, Median, TrimmedMean};
use expout_tables::record::FlatRecord;
use expout_tables::table::{build_all, Table, TableSpec};
use rand::{Rng, SeedableRng};

const SAMPLE_SIZES: [usize; 3] = [10, 100, 1_000];
const WORKS: [&str; 8] = ["bubble", "lsgraph", "pma", "terrace", "aspen", "cpam", "dhb", "gbbs"];

fn sample(n: usize) -> Vec<f64> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    (0..n).map(|_| rng.gen_range(0.0..1000.0)).collect()
}

fn records(threads: u32, seed: u64) -> Vec<FlatRecord> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let mut out = Vec::new();
    for work in WORKS {
        for t in 1..=threads {
            out.push(
                FlatRecord::builder(format!("{work}-{t}.txt"))
                    .meta("work", work)
                    .meta("threads", t.to_string())
                    .metric("throughput", rng.gen_range(0.0..1000.0))
                    .build(),
            );
        }
    }
    out
}

/// Benchmark per-cell reducers
fn bench_reducers(c: &mut Criterion) {
    let mut group = c.benchmark_group("cell_reducers");

    for size in SAMPLE_SIZES {
        let data = sample(size);
        group.bench_with_input(BenchmarkId::new("trimmed_mean", size), &data, |b, data| {
            b.iter(|| trimmed_mean(black_box(data)));
        });
        group.bench_with_input(BenchmarkId::new("median", size), &data, |b, data| {
            b.iter(|| Median.reduce(black_box(data)));
        });
        group.bench_with_input(BenchmarkId::new("mean", size), &data, |b, data| {
            b.iter(|| Mean.reduce(black_box(data)));
        });
    }

    group.finish();
}

/// Benchmark table assembly from records
fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("table_build");
    let spec = TableSpec::new("threads", "work", "throughput");

    for threads in [8, 64] {
        let recs = records(threads, 7);
        group.bench_with_input(BenchmarkId::new("build_all", recs.len()), &recs, |b, recs| {
            b.iter(|| build_all(black_box(recs), &spec));
        });
    }

    group.finish();
}

/// Benchmark cell-wise combination of repetitions
fn bench_combine(c: &mut Criterion) {
    let mut group = c.benchmark_group("combine_runs");
    let spec = TableSpec::new("threads", "work", "throughput");

    for runs in [5, 20] {
        let tables: Vec<Table> = (0..runs)
            .map(|seed| build_all(&records(32, seed), &spec))
            .collect::<Result<_, _>>()
            .unwrap();
        group.bench_with_input(BenchmarkId::new("robust", runs), &tables, |b, tables| {
            b.iter(|| combine(black_box(tables), &TrimmedMean::default()));
        });
        group.bench_with_input(BenchmarkId::new("mean", runs), &tables, |b, tables| {
            b.iter(|| combine(black_box(tables), &Mean));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_reducers, bench_build, bench_combine);
criterion_main!(benches);
