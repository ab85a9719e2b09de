//! The benchmark workload shared by every datastore backend.
//!
//! A backend implements [`Workload`]: it opens its store in [`before`][Workload::before],
//! releases it in [`after`][Workload::after], and runs each [`Operation`] through a
//! [`Bencher`]. Every backend writes the same rows, produced by [`DataGenerator`], so timings
//! are comparable across libraries.

use std::{
    fmt::{Display, Formatter},
    path::Path,
};

pub mod data;
pub mod measure;

pub use data::{DataGenerator, Record};
pub use measure::{Bencher, Iteration, Samples, Throughput};

/// Record counts every operation is run with.
pub const SIZES: [Size; 3] = [Size(10), Size(100), Size(1000)];

/// Number of records a backend populates its store with.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct Size(pub u64);

impl Size {
    pub fn rows(self) -> u64 {
        self.0
    }
}

impl Display for Size {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub enum Operation {
    BatchWrite,
    SimpleWrite,
    SimpleQuery,
    FullScan,
    Count,
    Sum,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 7] = [
        Self::BatchWrite,
        Self::SimpleWrite,
        Self::SimpleQuery,
        Self::FullScan,
        Self::Count,
        Self::Sum,
        Self::Delete,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::BatchWrite => "batchWrite",
            Self::SimpleWrite => "simpleWrite",
            Self::SimpleQuery => "simpleQuery",
            Self::FullScan => "fullScan",
            Self::Count => "count",
            Self::Sum => "sum",
            Self::Delete => "delete",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name().eq_ignore_ascii_case(name))
    }

    /// How many logical operations one iteration performs, for throughput figures.
    pub fn rows_per_iteration(self, size: Size) -> u64 {
        match self {
            Self::BatchWrite => size.rows(),
            _ => 1,
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A datastore under benchmark.
///
/// `before` and `after` bracket every operation run and are never timed. Each operation
/// returns the last value it observed (matched rows, rows written or removed, the sum or the
/// count) so results can be compared between backends.
pub trait Workload: Sized {
    const NAME: &'static str;

    /// Creates an empty store under `dir` that operations will fill with `size` records.
    fn before(dir: &Path, size: Size) -> anyhow::Result<Self>;

    /// Closes the store and removes its files.
    fn after(self) -> anyhow::Result<()>;

    /// Writes rows `0..size` in a single transaction.
    fn populate(&mut self) -> anyhow::Result<()>;

    /// Removes every record.
    fn clear(&mut self) -> anyhow::Result<()>;

    /// Number of records currently stored.
    fn stored(&self) -> anyhow::Result<u64>;

    fn simple_query(&mut self, b: &mut Bencher) -> anyhow::Result<i64>;
    fn simple_write(&mut self, b: &mut Bencher) -> anyhow::Result<i64>;
    fn batch_write(&mut self, b: &mut Bencher) -> anyhow::Result<i64>;
    fn full_scan(&mut self, b: &mut Bencher) -> anyhow::Result<i64>;
    fn delete(&mut self, b: &mut Bencher) -> anyhow::Result<i64>;
    fn sum(&mut self, b: &mut Bencher) -> anyhow::Result<i64>;
    fn count(&mut self, b: &mut Bencher) -> anyhow::Result<i64>;

    fn run(&mut self, op: Operation, b: &mut Bencher) -> anyhow::Result<i64> {
        match op {
            Operation::SimpleQuery => self.simple_query(b),
            Operation::SimpleWrite => self.simple_write(b),
            Operation::BatchWrite => self.batch_write(b),
            Operation::FullScan => self.full_scan(b),
            Operation::Delete => self.delete(b),
            Operation::Sum => self.sum(b),
            Operation::Count => self.count(b),
        }
    }
}
