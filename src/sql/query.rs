//! Queryable sources of typed rows
//!
//! A `Query<R>` describes `SELECT <R columns> FROM <table> AS t0`, optionally
//! joined to staged tables, anti-joined against them and narrowed by
//! predicates. It renders to a
//! `Statement` for a given dialect; it never talks to a session itself.

use std::fmt;
use std::marker::PhantomData;

use crate::errors::FilterResult;
use crate::session::Row;
use crate::value::FilterValue;

use super::dialect::Dialect;
use super::predicate::{ColumnRef, Predicate};
use super::statement::{ParameterBinder, Statement};

/// Alias of the source table in every rendered statement
pub const SOURCE_ALIAS: &str = "t0";

/// A table mapping: canonical name, column list and row decoding
pub trait Record: Sized + Send + 'static {
    /// Canonical table name
    const NAME: &'static str;
    /// Columns selected for this record, in decode order
    const COLUMNS: &'static [&'static str];

    fn from_row(row: &Row) -> FilterResult<Self>;
}

/// Typed accessor for one column of a record
pub struct Column<R, V> {
    name: &'static str,
    _marker: PhantomData<fn(&R) -> V>,
}

impl<R, V> Column<R, V> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<R, V> Clone for Column<R, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R, V> Copy for Column<R, V> {}

impl<R, V> fmt::Debug for Column<R, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Column").field(&self.name).finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Join {
    table: String,
    alias: String,
    on: Predicate,
}

/// A filterable, joinable source of `R` rows
pub struct Query<R> {
    table: String,
    empty: bool,
    joins: Vec<Join>,
    anti_joins: Vec<Join>,
    predicates: Vec<Predicate>,
    _marker: PhantomData<fn() -> R>,
}

impl<R> Clone for Query<R> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            empty: self.empty,
            joins: self.joins.clone(),
            anti_joins: self.anti_joins.clone(),
            predicates: self.predicates.clone(),
            _marker: PhantomData,
        }
    }
}

impl<R> fmt::Debug for Query<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("table", &self.table)
            .field("empty", &self.empty)
            .field("joins", &self.joins)
            .field("anti_joins", &self.anti_joins)
            .field("predicates", &self.predicates)
            .finish()
    }
}

impl<R: Record> Query<R> {
    /// All rows of the record's canonical table
    pub fn table() -> Self {
        Self::from_table(R::NAME)
    }

    /// All rows of the named table, decoded as `R`
    pub fn from_table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            empty: false,
            joins: Vec::new(),
            anti_joins: Vec::new(),
            predicates: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// The same source with no rows; executing it needs no round-trip
    pub fn into_empty(mut self) -> Self {
        self.empty = true;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn join_count(&self) -> usize {
        self.joins.len()
    }

    pub fn anti_join_count(&self) -> usize {
        self.anti_joins.len()
    }

    /// Reference to `column` on the source alias; text and UUID columns
    /// compare ignoring case
    pub fn column<V: FilterValue>(&self, column: Column<R, V>) -> ColumnRef {
        ColumnRef::new(SOURCE_ALIAS, column.name()).folding_case(V::COLUMN_TYPE.folds_case())
    }

    fn next_alias(&self) -> String {
        format!("t{}", self.joins.len() + self.anti_joins.len() + 1)
    }

    /// Adds a predicate (AND semantics)
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Inner-joins `table` on `source.column = table.other_column`
    pub fn join_on<V: FilterValue>(
        mut self,
        table: impl Into<String>,
        column: Column<R, V>,
        other_column: &'static str,
    ) -> Self {
        let join = self.keyed_join(table.into(), column, other_column);
        self.joins.push(join);
        self
    }

    /// Keeps only source rows with no match in `table` on
    /// `source.column = table.other_column`
    pub fn anti_join_on<V: FilterValue>(
        mut self,
        table: impl Into<String>,
        column: Column<R, V>,
        other_column: &'static str,
    ) -> Self {
        let join = self.keyed_join(table.into(), column, other_column);
        self.anti_joins.push(join);
        self
    }

    fn keyed_join<V: FilterValue>(
        &self,
        table: String,
        column: Column<R, V>,
        other_column: &'static str,
    ) -> Join {
        let alias = self.next_alias();
        let on = Predicate::column_equals(
            self.column(column),
            ColumnRef::new(alias.clone(), other_column),
        );
        Join { table, alias, on }
    }

    /// `SELECT t0.<columns> ...`
    pub fn render_select(&self, dialect: &dyn Dialect) -> Statement {
        let columns: Vec<String> = R::COLUMNS
            .iter()
            .map(|c| ColumnRef::new(SOURCE_ALIAS, *c).render(dialect))
            .collect();
        self.render_with_head(dialect, format!("SELECT {}", columns.join(", ")))
    }

    /// `SELECT t0.<column> ...`
    pub fn render_projection<V: FilterValue>(
        &self,
        dialect: &dyn Dialect,
        column: Column<R, V>,
    ) -> Statement {
        let head = format!("SELECT {}", self.column(column).render(dialect));
        self.render_with_head(dialect, head)
    }

    /// `SELECT COUNT(*) ...`
    pub fn render_count(&self, dialect: &dyn Dialect) -> Statement {
        self.render_with_head(dialect, "SELECT COUNT(*)".to_string())
    }

    /// Deletes the matched rows from the source table.
    ///
    /// Joins cannot appear in a DELETE target, so matches are selected by row
    /// identity in a subquery.
    pub fn render_delete(&self, dialect: &dyn Dialect) -> Statement {
        let identity = dialect.row_identity();
        let subquery = self.render_with_head(
            dialect,
            format!("SELECT {}.{}", SOURCE_ALIAS, identity),
        );
        Statement {
            sql: format!(
                "DELETE FROM {} WHERE {} IN ({})",
                dialect.quote_identifier(&self.table),
                identity,
                subquery.sql
            ),
            params: subquery.params,
        }
    }

    fn render_with_head(&self, dialect: &dyn Dialect, head: String) -> Statement {
        let mut binder = ParameterBinder::new(dialect);
        let mut sql = head;

        sql.push_str(&format!(
            " FROM {} AS {}",
            dialect.quote_identifier(&self.table),
            SOURCE_ALIAS
        ));

        for join in &self.joins {
            sql.push_str(&format!(
                " INNER JOIN {} AS {} ON {}",
                dialect.quote_identifier(&join.table),
                join.alias,
                join.on.render(dialect, &mut binder)
            ));
        }

        let mut conditions: Vec<String> = self
            .predicates
            .iter()
            .map(|p| p.render(dialect, &mut binder))
            .collect();
        for anti in &self.anti_joins {
            conditions.push(format!(
                "NOT EXISTS (SELECT 1 FROM {} AS {} WHERE {})",
                dialect.quote_identifier(&anti.table),
                anti.alias,
                anti.on.render(dialect, &mut binder)
            ));
        }
        if self.empty {
            conditions.push("1 = 0".to_string());
        }
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }

        binder.into_statement(sql)
    }
}
