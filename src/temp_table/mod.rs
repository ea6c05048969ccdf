//! Session-scoped temporary tables
//!
//! Stages bulk rows (any `StagedRecord`) or a set of distinct values (the
//! one-column `FieldValueRow`) into a temporary table so they can take part
//! in joins, anti-joins and other set operations, and guarantees the table
//! is dropped when the scope ends.

mod guard;
mod manager;
mod name;
mod row;

pub use manager::{
    create_and_load, create_and_load_rows, drop_table, with_scoped_rows, with_scoped_table,
};
pub use name::TempTableName;
pub use row::{FieldValueRow, StagedRecord, TempTable, ValueTable, ROW_NAME, VALUE_COLUMN};
