//! Hand-written SQL through rusqlite, the baseline every other backend is compared with.

use std::{
    hint::black_box,
    path::{Path, PathBuf},
};

use anyhow::Context;
use rusqlite::{params, CachedStatement, Connection};
use workload::{Bencher, DataGenerator, Size, Workload};

use super::{remove_sqlite_files, Filter, FULL_SCAN, SIMPLE_QUERY};

const CREATE: &str = r#"
    DROP TABLE IF EXISTS Simple;
    CREATE TABLE Simple ( id INTEGER PRIMARY KEY, name TEXT, age INTEGER, hired INTEGER );
"#;
const INSERT: &str = "INSERT INTO Simple VALUES (?1, ?2, ?3, ?4)";
const SELECT: &str = "SELECT * FROM Simple WHERE hired = ?1 AND age BETWEEN ?2 AND ?3 AND name = ?4";
const DELETE: &str = "DELETE FROM Simple";
const SUM: &str = "SELECT SUM(age) AS sum FROM Simple";
const COUNT: &str = "SELECT COUNT(*) AS count FROM Simple";

#[derive(Debug)]
pub struct SqliteStore {
    path: PathBuf,
    conn: Connection,
    data: DataGenerator,
    size: Size,
}

fn insert_row(stmt: &mut CachedStatement<'_>, data: &DataGenerator, row: u64) -> rusqlite::Result<usize> {
    stmt.execute(params![row as i64, data.name(row), data.age(row), data.hired_as_int(row)])
}

impl SqliteStore {
    /// Inserts rows `0..size` in one transaction.
    fn add_rows(&mut self) -> rusqlite::Result<usize> {
        let tx = self.conn.transaction()?;
        let mut written = 0;
        {
            let mut stmt = tx.prepare_cached(INSERT)?;
            for row in 0..self.size.rows() {
                written += insert_row(&mut stmt, &self.data, row)?;
            }
        }
        tx.commit()?;
        Ok(written)
    }

    fn delete_rows(&mut self) -> rusqlite::Result<usize> {
        let tx = self.conn.transaction()?;
        let removed = tx.execute(DELETE, [])?;
        tx.commit()?;
        Ok(removed)
    }

    /// Runs a filtered select, reading the id of every row, and returns the number of rows.
    fn select(&self, filter: &Filter) -> rusqlite::Result<i64> {
        let mut stmt = self.conn.prepare_cached(SELECT)?;
        let mut rows = stmt.query(params![filter.hired as i64, filter.min_age, filter.max_age, filter.name])?;
        let mut n = 0;
        while let Some(row) = rows.next()? {
            black_box(row.get::<_, i64>(0)?);
            n += 1;
        }
        Ok(n)
    }

    fn count_rows(&self) -> rusqlite::Result<i64> {
        self.conn.prepare_cached(COUNT)?.query_row([], |row| row.get(0))
    }
}

impl Workload for SqliteStore {
    const NAME: &'static str = "sqlite";

    fn before(dir: &Path, size: Size) -> anyhow::Result<Self> {
        let path = dir.join("benchmark.sqlite");
        remove_sqlite_files(&path)?;
        let conn = Connection::open(&path).with_context(|| format!("could not open {}", path.display()))?;
        conn.execute_batch(CREATE)?;
        Ok(Self {
            path,
            conn,
            data: DataGenerator::new(),
            size,
        })
    }

    fn after(self) -> anyhow::Result<()> {
        if let Err((_, e)) = self.conn.close() {
            return Err(e.into());
        }
        remove_sqlite_files(&self.path)
    }

    fn populate(&mut self) -> anyhow::Result<()> {
        self.add_rows()?;
        Ok(())
    }

    fn clear(&mut self) -> anyhow::Result<()> {
        self.delete_rows()?;
        Ok(())
    }

    fn stored(&self) -> anyhow::Result<u64> {
        Ok(self.count_rows()? as u64)
    }

    fn simple_query(&mut self, b: &mut Bencher) -> anyhow::Result<i64> {
        let mut matched = 0;
        b.measure_repeated(|it| {
            it.untimed(|| self.add_rows())?;
            matched = self.select(&SIMPLE_QUERY)?;
            it.untimed(|| self.delete_rows())?;
            Ok(())
        })?;
        Ok(matched)
    }

    fn simple_write(&mut self, b: &mut Bencher) -> anyhow::Result<i64> {
        let mut row = 0;
        let mut written = 0;
        b.measure_repeated(|it| {
            it.untimed(|| self.delete_rows())?;
            let tx = self.conn.transaction()?;
            let n = {
                let mut stmt = tx.prepare_cached(INSERT)?;
                insert_row(&mut stmt, &self.data, row)?
            };
            tx.commit()?;
            written = n as i64;
            row += 1;
            Ok(())
        })?;
        Ok(written)
    }

    fn batch_write(&mut self, b: &mut Bencher) -> anyhow::Result<i64> {
        let mut written = 0;
        b.measure_repeated(|it| {
            it.untimed(|| self.delete_rows())?;
            written = self.add_rows()? as i64;
            Ok(())
        })?;
        Ok(written)
    }

    fn full_scan(&mut self, b: &mut Bencher) -> anyhow::Result<i64> {
        self.add_rows()?;
        let mut matched = 0;
        b.measure_repeated(|_| {
            matched = self.select(&FULL_SCAN)?;
            Ok(())
        })?;
        Ok(matched)
    }

    fn delete(&mut self, b: &mut Bencher) -> anyhow::Result<i64> {
        let mut removed = 0;
        b.measure_repeated(|it| {
            it.untimed(|| self.add_rows())?;
            removed = self.delete_rows()? as i64;
            Ok(())
        })?;
        Ok(removed)
    }

    fn sum(&mut self, b: &mut Bencher) -> anyhow::Result<i64> {
        self.add_rows()?;
        let mut sum = 0;
        b.measure_repeated(|_| {
            sum = self
                .conn
                .prepare_cached(SUM)?
                .query_row([], |row| row.get::<_, Option<i64>>(0))?
                .unwrap_or(0);
            Ok(())
        })?;
        Ok(sum)
    }

    fn count(&mut self, b: &mut Bencher) -> anyhow::Result<i64> {
        self.add_rows()?;
        let mut count = 0;
        b.measure_repeated(|_| {
            count = self.count_rows()?;
            Ok(())
        })?;
        Ok(count)
    }
}
