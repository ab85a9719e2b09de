use rusqlite::{types::Value, Row};

use crate::error::{Error, Result};

/// A type persisted as one row of its own table.
///
/// `values` must return one value per entry of `COLUMNS`, in the same order; `from_row` reads
/// a row selected with the columns in that order.
pub trait Entity: Sized {
    const TABLE: &'static str;
    const COLUMNS: &'static [Column];

    fn values(&self) -> Vec<Value>;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Affinity {
    Integer,
    Real,
    Text,
    Blob,
}

impl Affinity {
    fn sql(self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Real => "REAL",
            Self::Text => "TEXT",
            Self::Blob => "BLOB",
        }
    }

    fn numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Real)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Column {
    pub name: &'static str,
    pub affinity: Affinity,
    pub primary_key: bool,
}

impl Column {
    pub const fn new(name: &'static str, affinity: Affinity) -> Self {
        Self {
            name,
            affinity,
            primary_key: false,
        }
    }

    pub const fn integer(name: &'static str) -> Self {
        Self::new(name, Affinity::Integer)
    }

    pub const fn text(name: &'static str) -> Self {
        Self::new(name, Affinity::Text)
    }

    /// Booleans are stored as `0`/`1` integers.
    pub const fn boolean(name: &'static str) -> Self {
        Self::new(name, Affinity::Integer)
    }

    pub const fn primary_key(self) -> Self {
        Self {
            primary_key: true,
            ..self
        }
    }
}

pub(crate) fn column<E: Entity>(name: &str) -> Result<&'static Column> {
    E::COLUMNS
        .iter()
        .find(|c| c.name == name)
        .ok_or_else(|| Error::UnknownColumn {
            table: E::TABLE,
            column: name.to_owned(),
        })
}

pub(crate) fn numeric_column<E: Entity>(name: &str) -> Result<&'static Column> {
    let c = column::<E>(name)?;
    if !c.affinity.numeric() {
        return Err(Error::NotNumeric {
            table: E::TABLE,
            column: c.name,
        });
    }
    Ok(c)
}

pub(crate) fn column_list<E: Entity>() -> String {
    E::COLUMNS.iter().map(|c| format!("`{}`", c.name)).collect::<Vec<_>>().join(", ")
}

pub(crate) fn create_table_sql<E: Entity>() -> String {
    let mut defs = E::COLUMNS
        .iter()
        .map(|c| format!("`{}` {} NOT NULL", c.name, c.affinity.sql()))
        .collect::<Vec<_>>();
    let keys = E::COLUMNS
        .iter()
        .filter(|c| c.primary_key)
        .map(|c| format!("`{}`", c.name))
        .collect::<Vec<_>>();
    if !keys.is_empty() {
        defs.push(format!("PRIMARY KEY({})", keys.join(", ")));
    }
    format!("CREATE TABLE IF NOT EXISTS `{}` ({})", E::TABLE, defs.join(", "))
}

pub(crate) fn insert_sql<E: Entity>() -> String {
    let params = (1..=E::COLUMNS.len()).map(|i| format!("?{i}")).collect::<Vec<_>>().join(", ");
    format!("INSERT INTO `{}` ({}) VALUES ({})", E::TABLE, column_list::<E>(), params)
}
