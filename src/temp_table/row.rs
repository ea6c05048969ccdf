//! Row shapes of staged tables
//!
//! Any `StagedRecord` can be bulk-loaded into a temporary table.
//! `FieldValueRow<V>` is the one-column shape used for candidate values.

use std::marker::PhantomData;

use crate::errors::FilterResult;
use crate::session::Row;
use crate::sql::{Column, ColumnSpec, Query, Record, TableSpec};
use crate::value::{FilterValue, SqlValue};

/// Canonical name of the staged row type, the default table name
pub const ROW_NAME: &str = "FieldValueRow";

/// Name of the single value column
pub const VALUE_COLUMN: &str = "Value";

/// A record that can be bulk-loaded into a temporary table
pub trait StagedRecord: Record {
    /// Column shapes, in `Record::COLUMNS` order
    fn column_specs() -> Vec<ColumnSpec>;

    /// Column values, in `Record::COLUMNS` order
    fn to_sql_values(&self) -> Vec<SqlValue>;

    /// Table shape for a staged table named `name`
    fn table_spec(name: &str) -> TableSpec {
        TableSpec::new(name, Self::column_specs())
    }
}

/// One staged candidate value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValueRow<V> {
    pub value: V,
}

impl<V: FilterValue> FieldValueRow<V> {
    pub const VALUE: Column<Self, V> = Column::new(VALUE_COLUMN);

    pub fn new(value: V) -> Self {
        Self { value }
    }
}

impl<V: FilterValue> Record for FieldValueRow<V> {
    const NAME: &'static str = ROW_NAME;
    const COLUMNS: &'static [&'static str] = &[VALUE_COLUMN];

    fn from_row(row: &Row) -> FilterResult<Self> {
        Ok(Self {
            value: row.get(VALUE_COLUMN)?,
        })
    }
}

impl<V: FilterValue> StagedRecord for FieldValueRow<V> {
    fn column_specs() -> Vec<ColumnSpec> {
        vec![ColumnSpec::required(VALUE_COLUMN, V::COLUMN_TYPE)]
    }

    fn to_sql_values(&self) -> Vec<SqlValue> {
        vec![self.value.to_sql_value()]
    }
}

/// Handle to a created temporary table of `R` rows
///
/// Owned by the scope that created it. Dropping the handle does not drop the
/// table; use `drop_table` or the scoped helpers.
#[derive(Debug, Clone)]
pub struct TempTable<R> {
    name: String,
    staged_rows: u64,
    _marker: PhantomData<fn() -> R>,
}

/// Handle to a staged table of candidate values
pub type ValueTable<V> = TempTable<FieldValueRow<V>>;

impl<R: StagedRecord> TempTable<R> {
    pub(crate) fn new(name: String, staged_rows: u64) -> Self {
        Self {
            name,
            staged_rows,
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of rows loaded
    pub fn staged_rows(&self) -> u64 {
        self.staged_rows
    }

    /// Query over the staged rows
    pub fn query(&self) -> Query<R> {
        Query::from_table(self.name.clone())
    }
}

impl<V: FilterValue> ValueTable<V> {
    pub fn value_column(&self) -> Column<FieldValueRow<V>, V> {
        FieldValueRow::<V>::VALUE
    }
}
