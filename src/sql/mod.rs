//! Statement construction
//!
//! A small query-building layer covering exactly what value filtering needs:
//! typed sources, equality and membership predicates, inner joins against
//! staged tables, temp-table DDL, and rendering with bound parameters.

mod ddl;
mod dialect;
mod predicate;
mod query;
mod statement;

pub use ddl::{ColumnSpec, TableSpec};
pub use dialect::{Dialect, SqliteDialect};
pub use predicate::{ColumnRef, Operand, Predicate};
pub use query::{Column, Query, Record, SOURCE_ALIAS};
pub use statement::{ParameterBinder, Statement};
