//! Typed scalar values and candidate value sets

mod scalar;
mod set;

pub use scalar::{ColumnType, FilterValue, SqlValue};
pub use set::ValueSet;
