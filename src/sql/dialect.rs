//! Backend-specific SQL syntax
//!
//! The filter logic never writes SQL text directly; it goes through a
//! `Dialect` so identifier quoting, parameter markers, temp-table DDL and the
//! bound-parameter ceiling stay with the backend.

use crate::value::{ColumnType, SqlValue};

use super::ddl::TableSpec;

/// SQL syntax and limits of one backend
pub trait Dialect: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &'static str;

    /// Maximum number of bound parameters in one statement
    fn max_parameters(&self) -> usize;

    /// Leading marker that identifies a temporary table name
    fn temp_marker(&self) -> char {
        '#'
    }

    fn quote_identifier(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    /// Marker for the 1-based parameter `index`
    fn parameter_marker(&self, index: usize) -> String {
        format!("@p{}", index)
    }

    fn literal(&self, value: &SqlValue) -> String {
        value.to_literal()
    }

    fn column_type(&self, ty: ColumnType) -> &'static str;

    /// Collation that compares ignoring case, applied to text and UUID comparisons
    fn case_insensitive_collation(&self) -> &'static str;

    /// Column that identifies a physical row, used to render deletes of a joined query
    fn row_identity(&self) -> &'static str;

    fn create_temp_table(&self, spec: &TableSpec) -> String;

    fn drop_temp_table(&self, name: &str, if_exists: bool) -> String;
}

/// SQLite syntax
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// SQLITE_MAX_VARIABLE_NUMBER for 3.32 and later
    pub const MAX_VARIABLE_NUMBER: usize = 32_766;
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn max_parameters(&self) -> usize {
        Self::MAX_VARIABLE_NUMBER
    }

    fn column_type(&self, ty: ColumnType) -> &'static str {
        match ty {
            ColumnType::Int32 | ColumnType::Int64 => "INTEGER",
            ColumnType::Text | ColumnType::Uuid => "TEXT COLLATE NOCASE",
        }
    }

    // NOCASE folds ASCII only; `FilterValue::dedup_key` folds the same way
    fn case_insensitive_collation(&self) -> &'static str {
        "NOCASE"
    }

    fn row_identity(&self) -> &'static str {
        "rowid"
    }

    fn create_temp_table(&self, spec: &TableSpec) -> String {
        let columns: Vec<String> = spec
            .columns
            .iter()
            .map(|c| {
                format!(
                    "{} {}{}",
                    self.quote_identifier(&c.name),
                    self.column_type(c.ty),
                    if c.nullable { "" } else { " NOT NULL" }
                )
            })
            .collect();
        format!(
            "CREATE TEMP TABLE {} ({})",
            self.quote_identifier(&spec.name),
            columns.join(", ")
        )
    }

    fn drop_temp_table(&self, name: &str, if_exists: bool) -> String {
        // Schema-qualified so a permanent table with the same name is never hit
        format!(
            "DROP TABLE {}temp.{}",
            if if_exists { "IF EXISTS " } else { "" },
            self.quote_identifier(name)
        )
    }
}
