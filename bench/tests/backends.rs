//! Integration tests: every backend on real files, checked against the same expectations.

use std::path::Path;

use datastore_bench::{
    backend::{MappedStore, ObjectStore, SqliteStore},
    Backend, Outcome, RunConfig,
};
use workload::{Bencher, Operation, Size, Workload};

fn bencher() -> Bencher {
    Bencher::new(1, 3)
}

fn dir_is_empty(dir: &Path) -> bool {
    fs_err::read_dir(dir).expect("read_dir").next().is_none()
}

fn lifecycle<W: Workload>() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut store = W::before(dir.path(), Size(100)).expect("before");
    assert_eq!(store.stored().unwrap(), 0, "{} not empty after before", W::NAME);

    store.populate().unwrap();
    assert_eq!(store.stored().unwrap(), 100);
    store.clear().unwrap();
    assert_eq!(store.stored().unwrap(), 0);

    store.populate().unwrap();
    store.after().expect("after");
    assert!(dir_is_empty(dir.path()), "{} left files behind", W::NAME);

    // A fresh store does not see rows written by a previous one.
    let store = W::before(dir.path(), Size(100)).expect("before");
    assert_eq!(store.stored().unwrap(), 0);
    store.after().unwrap();
}

fn observed<W: Workload>(size: u64, op: Operation) -> i64 {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut store = W::before(dir.path(), Size(size)).expect("before");
    let mut b = bencher();
    let observed = store.run(op, &mut b).unwrap_or_else(|e| panic!("{} {op}: {e:#}", W::NAME));
    assert_eq!(b.samples().len(), 3);
    store.after().expect("after");
    observed
}

fn expectations<W: Workload>() {
    for (size, sum) in [(10, 245), (100, 3350)] {
        assert_eq!(observed::<W>(size, Operation::SimpleQuery), 1, "{}", W::NAME);
        assert_eq!(observed::<W>(size, Operation::SimpleWrite), 1, "{}", W::NAME);
        assert_eq!(observed::<W>(size, Operation::BatchWrite), size as i64, "{}", W::NAME);
        assert_eq!(observed::<W>(size, Operation::FullScan), 0, "{}", W::NAME);
        assert_eq!(observed::<W>(size, Operation::Delete), size as i64, "{}", W::NAME);
        assert_eq!(observed::<W>(size, Operation::Sum), sum, "{}", W::NAME);
        assert_eq!(observed::<W>(size, Operation::Count), size as i64, "{}", W::NAME);
    }
}

/// Write operations report the rows they actually left in the store.
fn writes_match_store<W: Workload>() {
    for (warmup, iterations) in [(0, 0), (1, 3)] {
        for op in [Operation::SimpleWrite, Operation::BatchWrite] {
            let dir = tempfile::tempdir().expect("tempdir");
            let mut store = W::before(dir.path(), Size(10)).expect("before");
            let observed = store.run(op, &mut Bencher::new(warmup, iterations)).expect("run");
            let stored = store.stored().unwrap();
            assert_eq!(observed, stored as i64, "{} {op} after {iterations} iterations", W::NAME);
            if iterations == 0 {
                assert_eq!(observed, 0, "{} {op} reported rows it never wrote", W::NAME);
            }
            store.after().expect("after");
        }
    }
}

#[test]
fn objects_writes_match_store() {
    writes_match_store::<ObjectStore>();
}

#[test]
fn mapped_writes_match_store() {
    writes_match_store::<MappedStore>();
}

#[test]
fn sqlite_writes_match_store() {
    writes_match_store::<SqliteStore>();
}

#[test]
fn objects_lifecycle() {
    lifecycle::<ObjectStore>();
}

#[test]
fn mapped_lifecycle() {
    lifecycle::<MappedStore>();
}

#[test]
fn sqlite_lifecycle() {
    lifecycle::<SqliteStore>();
}

#[test]
fn objects_results() {
    expectations::<ObjectStore>();
}

#[test]
fn mapped_results() {
    expectations::<MappedStore>();
}

#[test]
fn sqlite_results() {
    expectations::<SqliteStore>();
}

#[test]
fn full_run_agrees_across_backends() {
    let dir = tempfile::tempdir().expect("tempdir");
    let csv = dir.path().join("csv");
    let config = RunConfig::new(dir.path().join("storage"))
        .sizes([Size(10)])
        .warmup(0)
        .iterations(2)
        .csv_dir(&csv);
    let results = datastore_bench::run(&config).expect("run");

    assert_eq!(results.measurements().len(), Backend::ALL.len() * Operation::ALL.len());
    assert_eq!(results.failures().count(), 0);
    for op in Operation::ALL {
        let values = Backend::ALL
            .iter()
            .map(|&b| results.get(b, op, Size(10)).and_then(Outcome::observed))
            .collect::<Vec<_>>();
        assert!(values.iter().all(|v| v.is_some() && *v == values[0]), "{op}: {values:?}");
        for backend in Backend::ALL {
            assert!(results.speedup(backend, op, Size(10)).is_some());
        }
    }
    assert!(dir_is_empty(&dir.path().join("storage")));

    results.write_csv(config.csv_output().expect("csv dir")).unwrap();
    assert!(csv.join("10").join("summary.csv").is_file());
    assert!(csv.join("10").join("sqlite_batchWrite.csv").is_file());
}
