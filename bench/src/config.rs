use std::path::PathBuf;

use anyhow::{bail, Context};
use workload::{Operation, Size, SIZES};

use crate::backend::Backend;

/// What to benchmark and how often.
///
/// Created with [`RunConfig::new`] and adjusted through its consuming setters, or from the
/// environment with [`with_env_overrides`][Self::with_env_overrides].
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub(crate) storage: PathBuf,
    pub(crate) sizes: Vec<Size>,
    pub(crate) backends: Vec<Backend>,
    pub(crate) operations: Vec<Operation>,
    pub(crate) warmup: u64,
    pub(crate) iterations: u64,
    pub(crate) csv_dir: Option<PathBuf>,
}

impl RunConfig {
    pub const DEFAULT_WARMUP: u64 = 5;
    pub const DEFAULT_ITERATIONS: u64 = 50;

    /// Benchmarks every backend and operation at [`SIZES`], keeping database files in `storage`.
    pub fn new(storage: impl Into<PathBuf>) -> Self {
        Self {
            storage: storage.into(),
            sizes: SIZES.to_vec(),
            backends: Backend::ALL.to_vec(),
            operations: Operation::ALL.to_vec(),
            warmup: Self::DEFAULT_WARMUP,
            iterations: Self::DEFAULT_ITERATIONS,
            csv_dir: None,
        }
    }

    /// Sizes are run in ascending order, duplicates removed.
    pub fn sizes(self, sizes: impl IntoIterator<Item = Size>) -> Self {
        let mut sizes = sizes.into_iter().collect::<Vec<_>>();
        sizes.sort();
        sizes.dedup();
        Self { sizes, ..self }
    }

    pub fn backends(self, backends: impl IntoIterator<Item = Backend>) -> Self {
        let mut backends = backends.into_iter().collect::<Vec<_>>();
        backends.sort();
        backends.dedup();
        Self { backends, ..self }
    }

    /// Operations are always run and reported in [`Operation::ALL`] order.
    pub fn operations(self, operations: impl IntoIterator<Item = Operation>) -> Self {
        let mut operations = operations.into_iter().collect::<Vec<_>>();
        operations.sort();
        operations.dedup();
        Self { operations, ..self }
    }

    pub fn warmup(self, warmup: u64) -> Self {
        Self { warmup, ..self }
    }

    pub fn iterations(self, iterations: u64) -> Self {
        Self { iterations, ..self }
    }

    /// Export raw samples and a summary per size under `dir`.
    pub fn csv_dir(self, dir: impl Into<PathBuf>) -> Self {
        Self {
            csv_dir: Some(dir.into()),
            ..self
        }
    }

    pub fn storage(&self) -> &std::path::Path {
        &self.storage
    }

    pub fn csv_output(&self) -> Option<&std::path::Path> {
        self.csv_dir.as_deref()
    }

    /// Applies `BENCH_*` environment variables on top of this configuration.
    pub fn with_env_overrides(self) -> anyhow::Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides read through `lookup`, then validates the result.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        if let Some(v) = lookup("BENCH_WARMUP") {
            self.warmup = v.trim().parse().with_context(|| format!("invalid BENCH_WARMUP {v:?}"))?;
        }
        if let Some(v) = lookup("BENCH_ITERATIONS") {
            self.iterations = v.trim().parse().with_context(|| format!("invalid BENCH_ITERATIONS {v:?}"))?;
        }
        if let Some(v) = lookup("BENCH_CSV_DIR") {
            if !v.trim().is_empty() {
                self = self.csv_dir(v.trim());
            }
        }
        if let Some(v) = lookup("BENCH_SIZES") {
            let sizes = split(&v)
                .map(|s| s.parse().map(Size).with_context(|| format!("invalid size {s:?} in BENCH_SIZES")))
                .collect::<anyhow::Result<Vec<_>>>()?;
            self = self.sizes(sizes);
        }
        if let Some(v) = lookup("BENCH_BACKENDS") {
            let backends = split(&v)
                .map(|s| Backend::from_name(s).with_context(|| format!("unknown backend {s:?} in BENCH_BACKENDS")))
                .collect::<anyhow::Result<Vec<_>>>()?;
            self = self.backends(backends);
        }
        if let Some(v) = lookup("BENCH_OPERATIONS") {
            let operations = split(&v)
                .map(|s| Operation::from_name(s).with_context(|| format!("unknown operation {s:?} in BENCH_OPERATIONS")))
                .collect::<anyhow::Result<Vec<_>>>()?;
            self = self.operations(operations);
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.iterations == 0 {
            bail!("at least one measured iteration is required");
        }
        if self.sizes.is_empty() {
            bail!("no sizes to benchmark");
        }
        if self.sizes.contains(&Size(0)) {
            bail!("sizes must be positive");
        }
        if self.backends.is_empty() {
            bail!("no backends to benchmark");
        }
        if self.operations.is_empty() {
            bail!("no operations to benchmark");
        }
        Ok(())
    }
}

fn split(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|s| !s.is_empty())
}
