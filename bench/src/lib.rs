use std::time::Duration;

use anyhow::Context;
use kdam::BarExt;
use log::{debug, info, warn};
use workload::{Bencher, Operation, Samples, Size, Workload};

pub use crate::{backend::Backend, config::RunConfig, report::Results};

pub mod backend;
pub mod config;
pub mod report;

/// The result of running one operation on one backend at one size.
#[derive(Debug)]
pub struct Measurement {
    pub backend: Backend,
    pub operation: Operation,
    pub size: Size,
    pub outcome: Outcome,
}

#[derive(Debug)]
pub enum Outcome {
    Timed {
        samples: Samples,
        /// Last value the operation observed, compared across backends.
        observed: i64,
    },
    Failed(anyhow::Error),
}

impl Outcome {
    pub fn samples(&self) -> Option<&Samples> {
        match self {
            Self::Timed { samples, .. } => Some(samples),
            Self::Failed(_) => None,
        }
    }

    pub fn observed(&self) -> Option<i64> {
        match self {
            Self::Timed { observed, .. } => Some(*observed),
            Self::Failed(_) => None,
        }
    }

    pub fn median(&self) -> Option<Duration> {
        self.samples().and_then(Samples::median)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Runs every configured operation for every backend and size.
///
/// Failures are recorded in the results rather than returned; only problems with the storage
/// directory itself abort the run.
pub fn run(config: &RunConfig) -> anyhow::Result<Results> {
    config.validate()?;
    fs_err::create_dir_all(config.storage())?;

    let mut bar = kdam::Bar::new(config.sizes.len() * config.backends.len());
    let mut results = Results::default();
    for &size in &config.sizes {
        for &backend in &config.backends {
            info!("benchmarking {backend} with {size} records");
            results.extend(backend.measure(size, config));
            bar.update(1)?;
        }
    }
    bar.clear()?;

    Ok(results)
}

/// Runs the configured operations for one backend at one size.
///
/// Every operation gets a fresh store: `before`, the operation, then `after`. When opening or
/// closing the store fails, the remaining operations are recorded as failed without running.
pub fn measure<W: Workload>(backend: Backend, size: Size, config: &RunConfig) -> Vec<Measurement> {
    let mut measurements = Vec::with_capacity(config.operations.len());
    let mut ops = config.operations.iter().copied();
    while let Some(operation) = ops.next() {
        let outcome = match run_one::<W>(size, operation, config) {
            Ok(outcome) => outcome,
            Err(e) => {
                let reason = format!("{e:#}");
                warn!("{backend} {operation} ({size}): {reason}");
                measurements.push(Measurement {
                    backend,
                    operation,
                    size,
                    outcome: Outcome::Failed(e),
                });
                for operation in ops.by_ref() {
                    measurements.push(Measurement {
                        backend,
                        operation,
                        size,
                        outcome: Outcome::Failed(anyhow::anyhow!("skipped after setup failure: {reason}")),
                    });
                }
                break;
            }
        };
        if let Outcome::Failed(e) = &outcome {
            warn!("{backend} {operation} ({size}): {e:#}");
        }
        measurements.push(Measurement {
            backend,
            operation,
            size,
            outcome,
        });
    }
    measurements
}

/// Runs one operation on a fresh store.
///
/// An operation error becomes [`Outcome::Failed`]; errors from `before` or `after` are returned,
/// with the operation's own error attached when both failed.
fn run_one<W: Workload>(size: Size, operation: Operation, config: &RunConfig) -> anyhow::Result<Outcome> {
    let mut store = W::before(config.storage(), size).with_context(|| format!("{} before {operation}", W::NAME))?;
    let mut b = Bencher::new(config.warmup, config.iterations);
    let result = store.run(operation, &mut b);
    if let Err(e) = store.after().with_context(|| format!("{} after {operation}", W::NAME)) {
        return Err(match result {
            Ok(_) => e,
            Err(op) => e.context(format!("{} {operation} failed first: {op:#}", W::NAME)),
        });
    }

    Ok(match result {
        Ok(observed) => {
            debug!("{} {operation} ({size}) observed {observed}", W::NAME);
            Outcome::Timed {
                samples: b.into_samples(),
                observed,
            }
        }
        Err(e) => Outcome::Failed(e.context(format!("{} {operation}", W::NAME))),
    })
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, path::Path};

    use super::*;

    thread_local! {
        static FAIL_AFTER_OPENED: Cell<usize> = const { Cell::new(usize::MAX) };
        static OPENED: Cell<usize> = const { Cell::new(0) };
        static FAIL_CLOSE: Cell<bool> = const { Cell::new(false) };
    }

    /// Stores nothing, fails `sum`, fails `before` once enough stores were opened, and fails
    /// `after` on request.
    struct Flaky;

    impl Workload for Flaky {
        const NAME: &'static str = "flaky";

        fn before(_: &Path, _: Size) -> anyhow::Result<Self> {
            let opened = OPENED.with(|o| {
                o.set(o.get() + 1);
                o.get()
            });
            if opened > FAIL_AFTER_OPENED.with(Cell::get) {
                anyhow::bail!("disk full");
            }
            Ok(Self)
        }

        fn after(self) -> anyhow::Result<()> {
            if FAIL_CLOSE.with(Cell::get) {
                anyhow::bail!("close failed");
            }
            Ok(())
        }

        fn populate(&mut self) -> anyhow::Result<()> {
            Ok(())
        }

        fn clear(&mut self) -> anyhow::Result<()> {
            Ok(())
        }

        fn stored(&self) -> anyhow::Result<u64> {
            Ok(0)
        }

        fn simple_query(&mut self, b: &mut Bencher) -> anyhow::Result<i64> {
            b.measure_repeated(|_| Ok(()))?;
            Ok(1)
        }

        fn simple_write(&mut self, b: &mut Bencher) -> anyhow::Result<i64> {
            b.measure_repeated(|_| Ok(()))?;
            Ok(1)
        }

        fn batch_write(&mut self, b: &mut Bencher) -> anyhow::Result<i64> {
            b.measure_repeated(|_| Ok(()))?;
            Ok(10)
        }

        fn full_scan(&mut self, b: &mut Bencher) -> anyhow::Result<i64> {
            b.measure_repeated(|_| Ok(()))?;
            Ok(0)
        }

        fn delete(&mut self, b: &mut Bencher) -> anyhow::Result<i64> {
            b.measure_repeated(|_| Ok(()))?;
            Ok(10)
        }

        fn sum(&mut self, _: &mut Bencher) -> anyhow::Result<i64> {
            anyhow::bail!("aggregation unsupported")
        }

        fn count(&mut self, b: &mut Bencher) -> anyhow::Result<i64> {
            b.measure_repeated(|_| Ok(()))?;
            Ok(10)
        }
    }

    fn config() -> RunConfig {
        RunConfig::new("unused").warmup(1).iterations(4)
    }

    #[test]
    fn operation_failure_is_isolated() {
        FAIL_AFTER_OPENED.with(|f| f.set(usize::MAX));
        let measurements = measure::<Flaky>(Backend::Objects, Size(10), &config());
        assert_eq!(measurements.len(), Operation::ALL.len());
        for m in &measurements {
            if m.operation == Operation::Sum {
                assert!(m.outcome.is_failed());
            } else {
                assert_eq!(m.outcome.samples().map(|s| s.raw().len()), Some(4));
            }
        }
        let batch = measurements.iter().find(|m| m.operation == Operation::BatchWrite).unwrap();
        assert_eq!(batch.outcome.observed(), Some(10));
    }

    #[test]
    fn setup_failure_skips_the_rest() {
        OPENED.with(|o| o.set(0));
        FAIL_AFTER_OPENED.with(|f| f.set(2));
        let measurements = measure::<Flaky>(Backend::Mapped, Size(100), &config());
        FAIL_AFTER_OPENED.with(|f| f.set(usize::MAX));

        assert_eq!(measurements.len(), Operation::ALL.len());
        assert!(!measurements[0].outcome.is_failed());
        assert!(!measurements[1].outcome.is_failed());
        assert!(measurements[2..].iter().all(|m| m.outcome.is_failed()));
        match &measurements[3].outcome {
            Outcome::Failed(e) => assert!(format!("{e:#}").contains("skipped after setup failure")),
            Outcome::Timed { .. } => unreachable!(),
        }
        assert!(measurements.iter().all(|m| m.backend == Backend::Mapped && m.size == Size(100)));
    }

    #[test]
    fn teardown_failure_keeps_operation_error() {
        FAIL_CLOSE.with(|f| f.set(true));
        let config = config().operations([Operation::Sum, Operation::Delete]);
        let measurements = measure::<Flaky>(Backend::Sqlite, Size(10), &config);
        FAIL_CLOSE.with(|f| f.set(false));

        assert_eq!(measurements.len(), 2);
        let Outcome::Failed(e) = &measurements[0].outcome else {
            panic!("sum should fail");
        };
        let message = format!("{e:#}");
        assert!(message.contains("aggregation unsupported"), "{message}");
        assert!(message.contains("close failed"), "{message}");
        assert!(measurements[1].outcome.is_failed());
    }
}
