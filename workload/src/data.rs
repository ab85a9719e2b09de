/// Number of distinct employee names. Names repeat every `NAME_COUNT` rows.
pub const NAME_COUNT: usize = 1000;
pub const MIN_AGE: i64 = 20;
/// Ages cycle through `MIN_AGE..MIN_AGE + AGE_SPAN`.
pub const AGE_SPAN: i64 = 30;

/// One generated employee row, identical for a given index in every backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record {
    pub id: i64,
    pub name: String,
    pub age: i64,
    pub hired: bool,
}

/// Produces the synthetic employee data written by every backend.
///
/// All accessors are pure functions of the row index. The only state is the name table, which
/// is built once and never modified, so a generator can be shared freely between threads.
#[derive(Debug, Clone)]
pub struct DataGenerator {
    names: Vec<String>,
}

impl DataGenerator {
    pub fn new() -> Self {
        let names = (0..NAME_COUNT).map(|i| format!("Foo{i}")).collect();
        Self { names }
    }

    pub fn name(&self, row: u64) -> &str {
        &self.names[(row % NAME_COUNT as u64) as usize]
    }

    pub fn age(&self, row: u64) -> i64 {
        (row % AGE_SPAN as u64) as i64 + MIN_AGE
    }

    /// Odd rows are hired.
    pub fn hired(&self, row: u64) -> bool {
        self.hired_as_int(row) == 1
    }

    /// The same fact as [`hired`][Self::hired], for stores without a boolean type.
    pub fn hired_as_int(&self, row: u64) -> i64 {
        (row % 2) as i64
    }

    pub fn record(&self, row: u64) -> Record {
        Record {
            id: row as i64,
            name: self.name(row).to_owned(),
            age: self.age(row),
            hired: self.hired(row),
        }
    }

    /// Records for rows `0..count`.
    pub fn records(&self, count: u64) -> impl ExactSizeIterator<Item = Record> + '_ {
        (0..count as usize).map(move |row| self.record(row as u64))
    }
}

impl Default for DataGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROWS: &[u64] = &[0, 1, 2, 29, 30, 31, 999, 1000, 1001, 12_345, u32::MAX as u64, u64::MAX];

    #[test]
    fn known_rows() {
        let g = DataGenerator::new();
        assert_eq!((g.name(0), g.age(0), g.hired(0)), ("Foo0", 20, false));
        assert_eq!((g.name(1), g.age(1), g.hired(1)), ("Foo1", 21, true));
        assert_eq!((g.name(1000), g.age(1000), g.hired(1000)), ("Foo0", 30, false));
        assert_eq!(g.name(999), "Foo999");
    }

    #[test]
    fn deterministic() {
        let a = DataGenerator::new();
        let b = DataGenerator::new();
        for &row in ROWS {
            assert_eq!(a.record(row), a.record(row));
            assert_eq!(a.record(row), b.record(row));
        }
    }

    #[test]
    fn name_wraps() {
        let g = DataGenerator::new();
        for &row in ROWS {
            assert_eq!(g.name(row), g.name(row % NAME_COUNT as u64), "row {row}");
        }
    }

    #[test]
    fn age_in_range() {
        let g = DataGenerator::new();
        for row in (0..2_000).chain(ROWS.iter().copied()) {
            let age = g.age(row);
            assert!((20..=49).contains(&age), "row {row} has age {age}");
            assert_eq!(age, (row % 30) as i64 + 20);
        }
    }

    #[test]
    fn hired_alternates() {
        let g = DataGenerator::new();
        for row in 0..100 {
            assert_ne!(g.hired(row), g.hired(row + 1));
            assert_eq!(g.hired(row), row % 2 == 1);
            assert_eq!(g.hired_as_int(row), g.hired(row) as i64);
        }
    }

    #[test]
    fn records_cover_prefix() {
        let g = DataGenerator::new();
        let records = g.records(10).collect::<Vec<_>>();
        assert_eq!(records.len(), 10);
        assert!(records.iter().enumerate().all(|(i, r)| r.id == i as i64));
        assert_eq!(records.iter().map(|r| r.age).sum::<i64>(), 245);
    }
}
