//! aerofilter - Cardinality-driven value filtering for relational queries
//!
//! Filters a query by a set of candidate values using the cheapest correct
//! SQL shape: a bound equality for one value, an IN list of bound parameters
//! for a few, and an inner join against a session-scoped temporary table for
//! many. The temporary table is always dropped when its scope ends.

pub mod errors;
pub mod filter;
pub mod harness;
pub mod session;
pub mod sql;
pub mod temp_table;
pub mod typed;
pub mod value;

pub use errors::{FilterError, FilterErrorCode, FilterResult, Severity};
pub use filter::{FilterConfig, FilterStrategy, StrategySelector};
pub use session::{Row, Session, SessionExt, SqliteSession};
pub use sql::{Column, Query, Record};
pub use temp_table::{FieldValueRow, StagedRecord, TempTable, ValueTable};
pub use typed::{Scalar, TypedTempTables, TypedValueFilter};
pub use value::{FilterValue, SqlValue, ValueSet};
