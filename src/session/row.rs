//! Materialized result rows

use std::sync::Arc;

use crate::errors::{FilterError, FilterResult};
use crate::value::{FilterValue, SqlValue};

/// One row returned by a session, addressable by column name
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<SqlValue>,
}

impl Row {
    pub fn new(columns: impl Into<Arc<[String]>>, values: Vec<SqlValue>) -> Self {
        Self {
            columns: columns.into(),
            values,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// Raw value of `column` (case-insensitive column match)
    pub fn value(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(column))
            .and_then(|i| self.values.get(i))
    }

    /// Typed value of `column`
    pub fn get<V: FilterValue>(&self, column: &str) -> FilterResult<V> {
        let value = self
            .value(column)
            .ok_or_else(|| FilterError::decode(column, "column not present in row"))?;
        V::from_sql_value(value).map_err(|reason| FilterError::decode(column, reason))
    }

    /// Typed value of the first column
    pub fn first<V: FilterValue>(&self) -> FilterResult<V> {
        let value = self
            .values
            .first()
            .ok_or_else(|| FilterError::decode("#0", "row has no columns"))?;
        let column = self.columns.first().map(String::as_str).unwrap_or("#0");
        V::from_sql_value(value).map_err(|reason| FilterError::decode(column, reason))
    }
}
