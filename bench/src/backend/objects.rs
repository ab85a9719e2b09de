//! Employees stored as serialized objects in a [sled] tree, keyed by id.

use std::{
    fmt::{Debug, Formatter},
    hint::black_box,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use workload::{Bencher, DataGenerator, Record, Size, Workload};

use super::{remove_path, Filter, FULL_SCAN, SIMPLE_QUERY};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
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

impl Employee {
    fn key(&self) -> [u8; 8] {
        self.id.to_be_bytes()
    }

    fn matches(&self, filter: &Filter) -> bool {
        filter.matches(self.hired, self.age, &self.name)
    }
}

pub struct ObjectStore {
    path: PathBuf,
    db: sled::Db,
    tree: sled::Tree,
    data: DataGenerator,
    size: Size,
}

impl Debug for ObjectStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStore")
            .field("path", &self.path)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl ObjectStore {
    fn employee(&self, row: u64) -> Employee {
        self.data.record(row).into()
    }

    fn employees(&self) -> Vec<Employee> {
        self.data.records(self.size.rows()).map(Employee::from).collect()
    }

    /// Writes one object, returning the number of objects written.
    fn put(&self, employee: &Employee) -> anyhow::Result<usize> {
        self.tree.insert(&employee.key()[..], bincode::serialize(employee)?)?;
        Ok(1)
    }

    /// Writes all of `employees` atomically, returning how many were written.
    fn put_all(&self, employees: &[Employee]) -> anyhow::Result<usize> {
        let mut batch = sled::Batch::default();
        let mut n = 0;
        for employee in employees {
            batch.insert(&employee.key()[..], bincode::serialize(employee)?);
            n += 1;
        }
        self.tree.apply_batch(batch)?;
        Ok(n)
    }

    fn objects(&self) -> impl Iterator<Item = anyhow::Result<Employee>> + '_ {
        self.tree.iter().values().map(|bytes| -> anyhow::Result<Employee> {
            let bytes = bytes?;
            Ok(bincode::deserialize(&bytes)?)
        })
    }

    fn find(&self, filter: &Filter) -> anyhow::Result<Vec<Employee>> {
        let mut found = vec![];
        for employee in self.objects() {
            let employee = employee?;
            if employee.matches(filter) {
                found.push(employee);
            }
        }
        Ok(found)
    }
}

impl Workload for ObjectStore {
    const NAME: &'static str = "objects";

    fn before(dir: &Path, size: Size) -> anyhow::Result<Self> {
        let path = dir.join("benchmark.objects");
        remove_path(&path)?;
        let db = sled::Config::new()
            .path(&path)
            .open()
            .with_context(|| format!("could not open object store at {}", path.display()))?;
        let tree = db.open_tree("employees")?;
        Ok(Self {
            path,
            db,
            tree,
            data: DataGenerator::new(),
            size,
        })
    }

    fn after(self) -> anyhow::Result<()> {
        let Self { path, db, tree, .. } = self;
        db.flush()?;
        drop(tree);
        drop(db);
        remove_path(&path)
    }

    fn populate(&mut self) -> anyhow::Result<()> {
        self.put_all(&self.employees())?;
        Ok(())
    }

    fn clear(&mut self) -> anyhow::Result<()> {
        self.tree.clear()?;
        Ok(())
    }

    fn stored(&self) -> anyhow::Result<u64> {
        Ok(self.tree.len() as u64)
    }

    fn simple_query(&mut self, b: &mut Bencher) -> anyhow::Result<i64> {
        let mut matched = 0;
        b.measure_repeated(|it| {
            it.untimed(|| self.populate())?;
            let found = self.find(&SIMPLE_QUERY)?;
            // Read a property so every backend materializes its results.
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
            written = self.put(&self.employee(row))? as i64;
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
            written = self.put_all(&employees)? as i64;
            Ok(())
        })?;
        Ok(written)
    }

    fn full_scan(&mut self, b: &mut Bencher) -> anyhow::Result<i64> {
        self.populate()?;
        let mut matched = 0;
        b.measure_repeated(|_| {
            matched = self.find(&FULL_SCAN)?.len() as i64;
            Ok(())
        })?;
        Ok(matched)
    }

    fn delete(&mut self, b: &mut Bencher) -> anyhow::Result<i64> {
        self.clear()?;
        let mut removed = 0;
        b.measure_repeated(|it| {
            removed = it.untimed(|| -> anyhow::Result<u64> {
                self.populate()?;
                self.stored()
            })? as i64;
            self.tree.clear()?;
            Ok(())
        })?;
        Ok(removed)
    }

    fn sum(&mut self, b: &mut Bencher) -> anyhow::Result<i64> {
        self.populate()?;
        let mut sum = 0;
        b.measure_repeated(|_| {
            let mut total = 0;
            for employee in self.objects() {
                total += employee?.age;
            }
            sum = total;
            Ok(())
        })?;
        Ok(sum)
    }

    fn count(&mut self, b: &mut Bencher) -> anyhow::Result<i64> {
        self.populate()?;
        let mut count = 0;
        b.measure_repeated(|_| {
            count = self.tree.len() as i64;
            Ok(())
        })?;
        Ok(count)
    }
}
