use thiserror::Error;

/// Errors returned by [`Database`][crate::Database] and [`Dao`][crate::Dao] operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The underlying SQLite call failed.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    /// A query or aggregate named a column the entity does not declare.
    #[error("no column `{}` in table `{}`", .column, .table)]
    UnknownColumn { table: &'static str, column: String },
    /// An aggregate was requested over a column that does not hold numbers.
    #[error("column `{}` of table `{}` is not numeric", .column, .table)]
    NotNumeric { table: &'static str, column: &'static str },
    /// A DAO was requested for an entity that was not passed to
    /// [`DatabaseBuilder::entity`][crate::DatabaseBuilder::entity].
    #[error("entity table `{}` is not registered with this database", .table)]
    Unregistered { table: &'static str },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
