//! Employees as `sqlmap` entities, accessed only through a typed DAO.

use std::{
    hint::black_box,
    path::{Path, PathBuf},
};

use anyhow::Context;
use rusqlite::{types::Value, Row};
use sqlmap::{Column, Dao, Database, Entity, Query};
use workload::{Bencher, DataGenerator, Record, Size, Workload};

use super::{remove_sqlite_files, Filter, FULL_SCAN, SIMPLE_QUERY};

#[derive(Debug, Clone, PartialEq)]
pub struct Employee {
    pub id: i64,
    pub name: String,
    pub age: i64,
    pub hired: bool,
}

impl From<Record> for Employee {
    fn from(r: Record) -> Self {
        Self {
            id: r.id,
            name: r.name,
            age: r.age,
            hired: r.hired,
        }
    }
}

impl Entity for Employee {
    const TABLE: &'static str = "Employee";
    const COLUMNS: &'static [Column] = &[
        Column::integer("id").primary_key(),
        Column::text("name"),
        Column::integer("age"),
        Column::boolean("hired"),
    ];

    fn values(&self) -> Vec<Value> {
        vec![
            self.id.into(),
            self.name.clone().into(),
            self.age.into(),
            self.hired.into(),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            age: row.get(2)?,
            hired: row.get(3)?,
        })
    }
}

fn query(filter: &Filter) -> Query<Employee> {
    Query::all()
        .eq("hired", filter.hired)
        .between("age", filter.min_age, filter.max_age)
        .eq("name", filter.name.to_owned())
}

#[derive(Debug)]
pub struct MappedStore {
    path: PathBuf,
    db: Database,
    data: DataGenerator,
    size: Size,
}

impl MappedStore {
    fn dao(&self) -> anyhow::Result<Dao<'_, Employee>> {
        Ok(self.db.dao()?)
    }

    fn employee(&self, row: u64) -> Employee {
        self.data.record(row).into()
    }

    fn employees(&self) -> Vec<Employee> {
        self.data.records(self.size.rows()).map(Employee::from).collect()
    }
}

impl Workload for MappedStore {
    const NAME: &'static str = "mapped";

    fn before(dir: &Path, size: Size) -> anyhow::Result<Self> {
        let path = dir.join("benchmark.mapped");
        remove_sqlite_files(&path)?;
        let db = Database::builder(&path)
            .entity::<Employee>()
            .open()
            .with_context(|| format!("could not open mapped database at {}", path.display()))?;
        Ok(Self {
            path,
            db,
            data: DataGenerator::new(),
            size,
        })
    }

    fn after(self) -> anyhow::Result<()> {
        self.db.close()?;
        remove_sqlite_files(&self.path)
    }

    fn populate(&mut self) -> anyhow::Result<()> {
        self.dao()?.insert_all(&self.employees())?;
        Ok(())
    }

    fn clear(&mut self) -> anyhow::Result<()> {
        self.db.clear_all_tables()?;
        Ok(())
    }

    fn stored(&self) -> anyhow::Result<u64> {
        Ok(self.dao()?.count()? as u64)
    }

    fn simple_query(&mut self, b: &mut Bencher) -> anyhow::Result<i64> {
        let q = query(&SIMPLE_QUERY);
        let mut matched = 0;
        b.measure_repeated(|it| {
            it.untimed(|| self.populate())?;
            let found = self.dao()?.select(&q)?;
            for employee in &found {
                black_box(employee.id);
            }
            matched = found.len() as i64;
            it.untimed(|| self.clear())
        })?;
        Ok(matched)
    }

    fn simple_write(&mut self, b: &mut Bencher) -> anyhow::Result<i64> {
        let mut row = 0;
        let mut written = 0;
        b.measure_repeated(|it| {
            it.untimed(|| self.clear())?;
            written = self.dao()?.insert(&self.employee(row))? as i64;
            row += 1;
            Ok(())
        })?;
        Ok(written)
    }

    fn batch_write(&mut self, b: &mut Bencher) -> anyhow::Result<i64> {
        let employees = self.employees();
        let mut written = 0;
        b.measure_repeated(|it| {
            it.untimed(|| self.clear())?;
            written = self.dao()?.insert_all(&employees)? as i64;
            Ok(())
        })?;
        Ok(written)
    }

    fn full_scan(&mut self, b: &mut Bencher) -> anyhow::Result<i64> {
        self.populate()?;
        let q = query(&FULL_SCAN);
        let mut matched = 0;
        b.measure_repeated(|_| {
            matched = self.dao()?.select(&q)?.len() as i64;
            Ok(())
        })?;
        Ok(matched)
    }

    fn delete(&mut self, b: &mut Bencher) -> anyhow::Result<i64> {
        self.clear()?;
        let mut removed = 0;
        b.measure_repeated(|it| {
            it.untimed(|| self.populate())?;
            removed = self.dao()?.delete_all()? as i64;
            Ok(())
        })?;
        Ok(removed)
    }

    fn sum(&mut self, b: &mut Bencher) -> anyhow::Result<i64> {
        self.populate()?;
        let mut sum = 0;
        b.measure_repeated(|_| {
            sum = self.dao()?.sum("age")?;
            Ok(())
        })?;
        Ok(sum)
    }

    fn count(&mut self, b: &mut Bencher) -> anyhow::Result<i64> {
        self.populate()?;
        let mut count = 0;
        b.measure_repeated(|_| {
            count = self.dao()?.count()?;
            Ok(())
        })?;
        Ok(count)
    }
}
