use std::{
    fmt::{Display, Formatter},
    io::ErrorKind,
    path::{Path, PathBuf},
};

use workload::{Size, Workload};

use crate::{config::RunConfig, Measurement};

pub mod mapped;
pub mod objects;
pub mod sqlite;

pub use mapped::MappedStore;
pub use objects::ObjectStore;
pub use sqlite::SqliteStore;

/// The datastore libraries that can be benchmarked.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub enum Backend {
    Objects,
    Mapped,
    Sqlite,
}

impl Backend {
    pub const ALL: [Backend; 3] = [Self::Objects, Self::Mapped, Self::Sqlite];

    /// The backend speed-ups are reported against.
    pub const BASELINE: Backend = Self::Sqlite;

    pub fn name(self) -> &'static str {
        match self {
            Self::Objects => ObjectStore::NAME,
            Self::Mapped => MappedStore::NAME,
            Self::Sqlite => SqliteStore::NAME,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.name().eq_ignore_ascii_case(name.trim()))
    }

    pub(crate) fn measure(self, size: Size, config: &RunConfig) -> Vec<Measurement> {
        match self {
            Self::Objects => crate::measure::<ObjectStore>(self, size, config),
            Self::Mapped => crate::measure::<MappedStore>(self, size, config),
            Self::Sqlite => crate::measure::<SqliteStore>(self, size, config),
        }
    }
}

impl Display for Backend {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Conditions of the two query operations.
#[derive(Debug, Copy, Clone)]
pub(crate) struct Filter {
    pub hired: bool,
    pub min_age: i64,
    pub max_age: i64,
    pub name: &'static str,
}

impl Filter {
    pub fn matches(&self, hired: bool, age: i64, name: &str) -> bool {
        hired == self.hired && (self.min_age..=self.max_age).contains(&age) && name == self.name
    }
}

/// `simpleQuery` matches exactly row 0 for every size up to 1000.
pub(crate) const SIMPLE_QUERY: Filter = Filter {
    hired: false,
    min_age: 20,
    max_age: 50,
    name: "Foo0",
};

/// `fullScan` can never match, so every record has to be visited.
pub(crate) const FULL_SCAN: Filter = Filter {
    hired: true,
    min_age: -2,
    max_age: -1,
    name: "Smile1",
};

/// Removes a file or directory, ignoring it if it does not exist.
pub(crate) fn remove_path(path: &Path) -> anyhow::Result<()> {
    match fs_err::metadata(path) {
        Ok(meta) if meta.is_dir() => fs_err::remove_dir_all(path)?,
        Ok(_) => fs_err::remove_file(path)?,
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Removes an SQLite database along with its journal and write-ahead log files.
pub(crate) fn remove_sqlite_files(path: &Path) -> anyhow::Result<()> {
    remove_path(path)?;
    for suffix in ["-journal", "-wal", "-shm"] {
        let mut sidecar = path.as_os_str().to_owned();
        sidecar.push(suffix);
        remove_path(&PathBuf::from(sidecar))?;
    }
    Ok(())
}
