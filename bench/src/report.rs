use std::{
    io::{BufWriter, Write},
    path::Path,
    time::Duration,
};

use cli_table::{format::Justify, Cell, CellStruct, Style, Table};
use workload::{Operation, Size};

use crate::{Backend, Measurement, Outcome};

/// Every measurement of a run, in the order they were taken.
#[derive(Debug, Default)]
pub struct Results(Vec<Measurement>);

impl Results {
    pub fn new(measurements: Vec<Measurement>) -> Self {
        Self(measurements)
    }

    pub fn extend(&mut self, measurements: impl IntoIterator<Item = Measurement>) {
        self.0.extend(measurements);
    }

    pub fn measurements(&self) -> &[Measurement] {
        &self.0
    }

    pub fn get(&self, backend: Backend, operation: Operation, size: Size) -> Option<&Outcome> {
        self.0
            .iter()
            .find(|m| m.backend == backend && m.operation == operation && m.size == size)
            .map(|m| &m.outcome)
    }

    pub fn failures(&self) -> impl Iterator<Item = &Measurement> {
        self.0.iter().filter(|m| m.outcome.is_failed())
    }

    pub fn sizes(&self) -> Vec<Size> {
        sorted(self.0.iter().map(|m| m.size))
    }

    pub fn backends(&self) -> Vec<Backend> {
        sorted(self.0.iter().map(|m| m.backend))
    }

    pub fn operations(&self) -> Vec<Operation> {
        sorted(self.0.iter().map(|m| m.operation))
    }

    /// Speed-up of `backend` over [`Backend::BASELINE`], if both have a median.
    pub fn speedup(&self, backend: Backend, operation: Operation, size: Size) -> Option<f64> {
        let baseline = self.get(Backend::BASELINE, operation, size)?.median()?;
        let value = self.get(backend, operation, size)?.median()?;
        Some(speedup(baseline, value))
    }

    /// Prints the median of every measurement, one row per size and operation.
    ///
    /// The fastest backend of each row is bold. The last column shows the value every backend
    /// observed, or each backend's value when they disagree.
    pub fn stdout(&self) -> anyhow::Result<()> {
        let backends = self.backends();
        let mut rows = vec![];
        for size in self.sizes() {
            for operation in self.operations() {
                let fastest = backends
                    .iter()
                    .filter_map(|&b| self.get(b, operation, size)?.median())
                    .min();
                let mut row = vec![size.cell(), operation.cell()];
                for &backend in &backends {
                    row.push(match self.get(backend, operation, size) {
                        Some(outcome) => match outcome.median() {
                            Some(median) => format!("{median:.2?}").cell().bold(Some(median) == fastest),
                            None if outcome.is_failed() => failed(),
                            None => missing(),
                        },
                        None => missing(),
                    });
                }
                row.push(self.observed(&backends, operation, size));
                rows.push(row.into_iter().map(|c| c.justify(Justify::Right)).collect::<Vec<_>>());
            }
        }

        let mut title = vec!["Size".to_owned(), "Operation".to_owned()];
        title.extend(backends.iter().map(|b| format!("{b} [median]")));
        title.push("Result".to_owned());
        cli_table::print_stdout(rows.table().title(title).dimmed(true))?;
        Ok(())
    }

    /// Prints throughput per backend: operations per second at the slowest iteration, on
    /// average, at the median and at the fastest iteration, and the number of bogus and real
    /// samples.
    pub fn analysis_stdout(&self) -> anyhow::Result<()> {
        let mut rows = vec![];
        for size in self.sizes() {
            for m in self.0.iter().filter(|m| m.size == size) {
                let mut row = vec![size.cell(), m.backend.cell(), m.operation.cell()];
                match m.outcome.samples() {
                    Some(samples) => {
                        match samples.throughput(m.operation.rows_per_iteration(size)) {
                            Some(t) => row.extend(
                                [t.slowest, t.mean, t.median, t.fastest].map(|ops| format!("{ops:.0}").cell()),
                            ),
                            None => row.extend([(); 4].map(|_| missing())),
                        }
                        row.push(samples.bogus().cell());
                        row.push(samples.len().cell());
                    }
                    None => {
                        row.extend([(); 4].map(|_| failed()));
                        row.extend([missing(), missing()]);
                    }
                }
                rows.push(row);
            }
        }
        let table = rows
            .table()
            .title(vec![
                "Size",
                "Backend",
                "Operation",
                "min ops/s",
                "average ops/s",
                "median ops/s",
                "max ops/s",
                "bogus",
                "real",
            ])
            .dimmed(true);
        cli_table::print_stdout(table)?;
        Ok(())
    }

    /// Prints the speed-up of every backend over raw SQLite.
    pub fn speedup_stdout(&self) -> anyhow::Result<()> {
        let backends = self
            .backends()
            .into_iter()
            .filter(|&b| b != Backend::BASELINE)
            .collect::<Vec<_>>();
        let mut rows = vec![];
        for size in self.sizes() {
            for operation in self.operations() {
                let mut row = vec![size.cell(), operation.cell()];
                for &backend in &backends {
                    row.push(match self.speedup(backend, operation, size) {
                        Some(s) => format!("{s:.2}").cell().bold(s > 1.0).justify(Justify::Right),
                        None => missing(),
                    });
                }
                rows.push(row);
            }
        }

        let mut title = vec!["Size".to_owned(), "Operation".to_owned()];
        title.extend(backends.iter().map(|b| format!("{b} vs {}", Backend::BASELINE)));
        cli_table::print_stdout(rows.table().title(title).dimmed(true))?;
        Ok(())
    }

    /// Writes raw samples and a summary for every size under `dir`.
    ///
    /// Each size gets a directory `dir/<size>/` holding `<backend>_<operation>.csv` with one
    /// duration in nanoseconds per line, and `summary.csv` with the minimum, maximum and
    /// median of every operation per backend.
    pub fn write_csv(&self, dir: &Path) -> anyhow::Result<()> {
        let operations = self.operations();
        for size in self.sizes() {
            let size_dir = dir.join(size.to_string());
            fs_err::create_dir_all(&size_dir)?;

            for m in self.0.iter().filter(|m| m.size == size) {
                let Some(samples) = m.outcome.samples() else {
                    continue;
                };
                let mut out = BufWriter::new(fs_err::File::create(size_dir.join(format!("{}_{}.csv", m.backend, m.operation)))?);
                for d in samples.raw() {
                    writeln!(out, "{}", d.as_nanos())?;
                }
                out.flush()?;
            }

            let mut out = BufWriter::new(fs_err::File::create(size_dir.join("summary.csv"))?);
            write!(out, "datastore")?;
            for op in &operations {
                write!(out, ";{op} (min);{op} (max);{op} (median)")?;
            }
            writeln!(out)?;
            for backend in self.backends() {
                write!(out, "{backend}")?;
                for &op in &operations {
                    match self.get(backend, op, size).and_then(Outcome::samples) {
                        Some(s) => write!(out, ";{};{};{}", nanos(s.min()), nanos(s.max()), nanos(s.median()))?,
                        None => write!(out, ";;;")?,
                    }
                }
                writeln!(out)?;
            }
            out.flush()?;
        }
        Ok(())
    }

    fn observed(&self, backends: &[Backend], operation: Operation, size: Size) -> CellStruct {
        let values = backends
            .iter()
            .filter_map(|&b| Some((b, self.get(b, operation, size)?.observed()?)))
            .collect::<Vec<_>>();
        match values.first() {
            None => missing(),
            Some(&(_, first)) if values.iter().all(|&(_, v)| v == first) => first.cell(),
            Some(_) => values
                .iter()
                .map(|(b, v)| format!("{b}={v}"))
                .collect::<Vec<_>>()
                .join(" ")
                .cell()
                .bold(true),
        }
    }
}

/// How much faster `value` is than `baseline`.
///
/// At least `1.0` when `value` is as fast or faster, `baseline / value`. Otherwise the negated
/// slowdown `-(value / baseline)`, so `-2.0` means twice as slow.
pub fn speedup(baseline: Duration, value: Duration) -> f64 {
    let (baseline, value) = (baseline.as_nanos() as f64, value.as_nanos() as f64);
    if value <= baseline {
        if value == 0.0 {
            return 1.0;
        }
        baseline / value
    } else {
        -(value / baseline)
    }
}

fn sorted<T: Ord>(items: impl Iterator<Item = T>) -> Vec<T> {
    let mut items = items.collect::<Vec<_>>();
    items.sort();
    items.dedup();
    items
}

fn nanos(d: Option<Duration>) -> String {
    d.map(|d| d.as_nanos().to_string()).unwrap_or_default()
}

fn failed() -> CellStruct {
    "FAILED".cell().dimmed(true).italic(true)
}

fn missing() -> CellStruct {
    "N/A".cell().dimmed(true).italic(true)
}
