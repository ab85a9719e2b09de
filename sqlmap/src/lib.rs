//! A small object mapping layer over SQLite.
//!
//! Types implementing [`Entity`] describe their table; a [`Database`] is opened with the set
//! of entities it holds and hands out typed [`Dao`]s for them. Filters are written with
//! [`Query`] instead of SQL strings.
//!
//! ```no_run
//! # use sqlmap::{Column, Database, Entity, Query};
//! # use rusqlite::{types::Value, Row};
//! struct Employee { id: i64, name: String, age: i64 }
//!
//! impl Entity for Employee {
//!     const TABLE: &'static str = "Employee";
//!     const COLUMNS: &'static [Column] =
//!         &[Column::integer("id").primary_key(), Column::text("name"), Column::integer("age")];
//!
//!     fn values(&self) -> Vec<Value> {
//!         vec![self.id.into(), self.name.clone().into(), self.age.into()]
//!     }
//!
//!     fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
//!         Ok(Self { id: row.get(0)?, name: row.get(1)?, age: row.get(2)? })
//!     }
//! }
//!
//! # fn main() -> sqlmap::Result<()> {
//! let db = Database::builder("staff.db").entity::<Employee>().open()?;
//! let dao = db.dao::<Employee>()?;
//! dao.insert(&Employee { id: 1, name: "Foo1".into(), age: 21 })?;
//! let young = dao.select(&Query::all().between("age", 20, 29))?;
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

use log::debug;
use rusqlite::Connection;

pub mod dao;
pub mod entity;
pub mod error;
pub mod query;

pub use dao::Dao;
pub use entity::{Affinity, Column, Entity};
pub use error::{Error, Result};
pub use query::Query;

/// An open SQLite database holding the tables of the registered entities.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
    tables: Vec<&'static str>,
}

impl Database {
    /// Returns a builder for a database stored at `path`, created if missing.
    pub fn builder(path: impl Into<PathBuf>) -> DatabaseBuilder {
        DatabaseBuilder {
            target: Target::File(path.into()),
            tables: vec![],
            write_ahead_log: true,
        }
    }

    /// Returns a builder for a private in-memory database.
    pub fn builder_in_memory() -> DatabaseBuilder {
        DatabaseBuilder {
            target: Target::Memory,
            tables: vec![],
            write_ahead_log: false,
        }
    }

    /// Typed access to `E`'s table.
    ///
    /// Fails with [`Error::Unregistered`] if `E` was not passed to [`DatabaseBuilder::entity`].
    pub fn dao<E: Entity>(&self) -> Result<Dao<'_, E>> {
        if !self.tables.contains(&E::TABLE) {
            return Err(Error::Unregistered { table: E::TABLE });
        }
        Ok(Dao::new(&self.conn))
    }

    /// Deletes every row of every registered table in one transaction.
    pub fn clear_all_tables(&self) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        for table in &self.tables {
            tx.execute(&format!("DELETE FROM `{table}`"), [])?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| e.into())
    }
}

#[derive(Debug)]
enum Target {
    File(PathBuf),
    Memory,
}

#[derive(Debug)]
struct Table {
    name: &'static str,
    create: String,
}

/// Options to open a [`Database`] with, created by [`Database::builder`].
#[derive(Debug)]
pub struct DatabaseBuilder {
    target: Target,
    tables: Vec<Table>,
    write_ahead_log: bool,
}

impl DatabaseBuilder {
    /// Registers `E`, creating its table on [`open`][Self::open] if it does not exist.
    pub fn entity<E: Entity>(mut self) -> Self {
        if self.tables.iter().all(|t| t.name != E::TABLE) {
            self.tables.push(Table {
                name: E::TABLE,
                create: entity::create_table_sql::<E>(),
            });
        }
        self
    }

    /// Whether file databases use SQLite's write-ahead log. Defaults to `true`.
    pub fn write_ahead_log(self, enabled: bool) -> Self {
        Self {
            write_ahead_log: enabled,
            ..self
        }
    }

    pub fn open(self) -> Result<Database> {
        let conn = match &self.target {
            Target::File(path) => Connection::open(path)?,
            Target::Memory => Connection::open_in_memory()?,
        };
        if self.write_ahead_log {
            let mode: String = conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
            debug!("journal mode {mode}");
        }
        for table in &self.tables {
            debug!("creating table {}", table.name);
            conn.execute_batch(&table.create)?;
        }
        Ok(Database {
            conn,
            tables: self.tables.into_iter().map(|t| t.name).collect(),
        })
    }
}
