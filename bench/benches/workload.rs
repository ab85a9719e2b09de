//! Criterion harness: every operation of every backend at each record count.

use std::time::Duration;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use datastore_bench::backend::{MappedStore, ObjectStore, SqliteStore};
use workload::{Bencher, Operation, Workload, SIZES};

fn bench_workload<W: Workload>(c: &mut Criterion) {
    let dir = tempfile::tempdir().expect("Failed to create scratch directory");
    for op in Operation::ALL {
        let mut group = c.benchmark_group(format!("{}/{op}", W::NAME));
        group.sample_size(10);
        group.measurement_time(Duration::from_secs(5));

        for size in SIZES {
            group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
                b.iter_custom(|iters| {
                    let mut store = W::before(dir.path(), size).expect("before failed");
                    let mut bencher = Bencher::new(0, iters);
                    store.run(op, &mut bencher).expect("operation failed");
                    store.after().expect("after failed");
                    bencher.total()
                });
            });
        }
        group.finish();
    }
}

fn bench_objects(c: &mut Criterion) {
    bench_workload::<ObjectStore>(c);
}

fn bench_mapped(c: &mut Criterion) {
    bench_workload::<MappedStore>(c);
}

fn bench_sqlite(c: &mut Criterion) {
    bench_workload::<SqliteStore>(c);
}

criterion_group!(benches, bench_objects, bench_mapped, bench_sqlite);
criterion_main!(benches);
