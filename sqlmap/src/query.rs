use std::{fmt::Debug, marker::PhantomData};

use rusqlite::types::Value;

use crate::{
    entity::{self, Entity},
    error::Result,
};

/// A filter over the rows of `E`'s table, combining every condition with `AND`.
///
/// Column names are checked against [`Entity::COLUMNS`] when the query runs.
pub struct Query<E> {
    conditions: Vec<Condition>,
    _entity: PhantomData<fn() -> E>,
}

#[derive(Debug, Clone)]
enum Condition {
    Eq { column: &'static str, value: Value },
    Between { column: &'static str, low: Value, high: Value },
}

impl<E: Entity> Query<E> {
    /// Matches every row.
    pub fn all() -> Self {
        Self {
            conditions: vec![],
            _entity: PhantomData,
        }
    }

    pub fn eq(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq {
            column,
            value: value.into(),
        });
        self
    }

    /// Inclusive on both ends, like SQL's `BETWEEN`.
    pub fn between(mut self, column: &'static str, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Between {
            column,
            low: low.into(),
            high: high.into(),
        });
        self
    }

    /// Renders `SELECT <select> FROM <table> [WHERE ...]` with numbered parameters.
    pub(crate) fn render(&self, select: &str) -> Result<(String, Vec<Value>)> {
        let mut sql = format!("SELECT {select} FROM `{}`", E::TABLE);
        let mut params = Vec::with_capacity(self.conditions.len() * 2);
        for (i, cond) in self.conditions.iter().enumerate() {
            sql.push_str(if i == 0 { " WHERE " } else { " AND " });
            match cond {
                Condition::Eq { column, value } => {
                    let c = entity::column::<E>(column)?;
                    params.push(value.clone());
                    sql.push_str(&format!("`{}` = ?{}", c.name, params.len()));
                }
                Condition::Between { column, low, high } => {
                    let c = entity::column::<E>(column)?;
                    params.push(low.clone());
                    params.push(high.clone());
                    sql.push_str(&format!("`{}` BETWEEN ?{} AND ?{}", c.name, params.len() - 1, params.len()));
                }
            }
        }
        Ok((sql, params))
    }
}

impl<E> Clone for Query<E> {
    fn clone(&self) -> Self {
        Self {
            conditions: self.conditions.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E> Debug for Query<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query").field("conditions", &self.conditions).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{entity::tests::Book, Error};

    #[test]
    fn render_all() {
        let (sql, params) = Query::<Book>::all().render("*").unwrap();
        assert_eq!(sql, "SELECT * FROM `Book`");
        assert!(params.is_empty());
    }

    #[test]
    fn render_conditions() {
        let q = Query::<Book>::all()
            .eq("read", false)
            .between("pages", 20, 50)
            .eq("title", "Dune".to_owned());
        let (sql, params) = q.render("COUNT(*)").unwrap();
        assert_eq!(
            sql,
            "SELECT COUNT(*) FROM `Book` WHERE `read` = ?1 AND `pages` BETWEEN ?2 AND ?3 AND `title` = ?4"
        );
        assert_eq!(
            params,
            vec![
                Value::Integer(0),
                Value::Integer(20),
                Value::Integer(50),
                Value::Text("Dune".to_owned()),
            ]
        );
    }

    #[test]
    fn unknown_column() {
        let r = Query::<Book>::all().eq("author", "Herbert".to_owned()).render("*");
        match r {
            Err(Error::UnknownColumn { table, column }) => {
                assert_eq!(table, "Book");
                assert_eq!(column, "author");
            }
            other => panic!("expected unknown column, got {other:?}"),
        }
    }
}
