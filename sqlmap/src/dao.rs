use std::marker::PhantomData;

use log::trace;
use rusqlite::{params_from_iter, Connection};

use crate::{
    entity::{self, Entity},
    error::Result,
    query::Query,
};

/// Typed access to the table of one entity.
///
/// Obtained from [`Database::dao`][crate::Database::dao]. Statements are prepared through the
/// connection's statement cache, so repeated calls do not re-parse SQL.
#[derive(Debug)]
pub struct Dao<'db, E> {
    conn: &'db Connection,
    _entity: PhantomData<fn() -> E>,
}

impl<'db, E: Entity> Dao<'db, E> {
    pub(crate) fn new(conn: &'db Connection) -> Self {
        Self {
            conn,
            _entity: PhantomData,
        }
    }

    /// Inserts one entity, returning the number of rows written.
    pub fn insert(&self, entity: &E) -> Result<usize> {
        let mut stmt = self.conn.prepare_cached(&entity::insert_sql::<E>())?;
        Ok(stmt.execute(params_from_iter(entity.values()))?)
    }

    /// Inserts every entity in one transaction, returning how many were written.
    pub fn insert_all<'a>(&self, entities: impl IntoIterator<Item = &'a E>) -> Result<usize>
    where
        E: 'a,
    {
        let tx = self.conn.unchecked_transaction()?;
        let mut written = 0;
        {
            let mut stmt = tx.prepare_cached(&entity::insert_sql::<E>())?;
            for entity in entities {
                written += stmt.execute(params_from_iter(entity.values()))?;
            }
        }
        tx.commit()?;
        trace!("inserted {written} rows into {}", E::TABLE);
        Ok(written)
    }

    pub fn select(&self, query: &Query<E>) -> Result<Vec<E>> {
        let (sql, params) = query.render(&entity::column_list::<E>())?;
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), |row| E::from_row(row))?;
        let found = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(found)
    }

    pub fn count(&self) -> Result<i64> {
        let (sql, _) = Query::<E>::all().render("COUNT(*)")?;
        let n = self.conn.prepare_cached(&sql)?.query_row([], |row| row.get(0))?;
        Ok(n)
    }

    /// Sum of an integer column, `0` for an empty table.
    pub fn sum(&self, column: &str) -> Result<i64> {
        let c = entity::numeric_column::<E>(column)?;
        let (sql, _) = Query::<E>::all().render(&format!("SUM(`{}`)", c.name))?;
        let n = self
            .conn
            .prepare_cached(&sql)?
            .query_row([], |row| row.get::<_, Option<i64>>(0))?;
        Ok(n.unwrap_or(0))
    }

    /// Deletes every row, returning how many were removed.
    pub fn delete_all(&self) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let removed = tx.execute(&format!("DELETE FROM `{}`", E::TABLE), [])?;
        tx.commit()?;
        Ok(removed)
    }
}
