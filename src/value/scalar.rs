//! Scalar values that can be staged or filtered by
//!
//! `SqlValue` is the untyped value exchanged with a session. `FilterValue`
//! ties a Rust type to its column type, its equality key and its conversions.

use std::fmt;
use std::hash::Hash;

use uuid::Uuid;

/// Column types a staged value can map to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int32,
    Int64,
    Text,
    Uuid,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Int32 => "int32",
            ColumnType::Int64 => "int64",
            ColumnType::Text => "text",
            ColumnType::Uuid => "uuid",
        }
    }

    /// Whether values of this type compare ignoring ASCII case.
    ///
    /// Matches the folding of `FilterValue::dedup_key` for text and UUIDs, so
    /// two candidates that collapse into one also match the same rows.
    pub fn folds_case(&self) -> bool {
        matches!(self, ColumnType::Text | ColumnType::Uuid)
    }
}

/// Untyped value bound to a statement or read back from a row
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Int32(i32),
    Int64(i64),
    Text(String),
    Uuid(Uuid),
}

impl SqlValue {
    /// Returns true for SQL NULL
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Renders the value as an inline SQL literal.
    ///
    /// Text is single-quoted with embedded quotes doubled.
    pub fn to_literal(&self) -> String {
        match self {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Int32(v) => v.to_string(),
            SqlValue::Int64(v) => v.to_string(),
            SqlValue::Text(v) => format!("'{}'", v.replace('\'', "''")),
            SqlValue::Uuid(v) => format!("'{}'", v.hyphenated()),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            SqlValue::Null => "null",
            SqlValue::Int32(_) => "int32",
            SqlValue::Int64(_) => "int64",
            SqlValue::Text(_) => "text",
            SqlValue::Uuid(_) => "uuid",
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_literal())
    }
}

/// A scalar type usable as a filter value and as a staged column.
///
/// `Key` defines set semantics: two values with equal keys are the same
/// candidate. Text folds ASCII case only, the same folding the rendered
/// `NOCASE` comparisons apply; everything else compares exactly.
pub trait FilterValue: Clone + fmt::Debug + Send + Sync + 'static {
    type Key: Eq + Hash + Send;

    const COLUMN_TYPE: ColumnType;

    fn dedup_key(&self) -> Self::Key;

    fn to_sql_value(&self) -> SqlValue;

    fn from_sql_value(value: &SqlValue) -> Result<Self, String>;
}

fn mismatch(expected: ColumnType, value: &SqlValue) -> String {
    format!("expected {}, found {}", expected.as_str(), value.kind())
}

impl FilterValue for i32 {
    type Key = i32;

    const COLUMN_TYPE: ColumnType = ColumnType::Int32;

    fn dedup_key(&self) -> i32 {
        *self
    }

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Int32(*self)
    }

    fn from_sql_value(value: &SqlValue) -> Result<Self, String> {
        match value {
            SqlValue::Int32(v) => Ok(*v),
            SqlValue::Int64(v) => {
                i32::try_from(*v).map_err(|_| format!("{} is out of range for int32", v))
            }
            other => Err(mismatch(ColumnType::Int32, other)),
        }
    }
}

impl FilterValue for i64 {
    type Key = i64;

    const COLUMN_TYPE: ColumnType = ColumnType::Int64;

    fn dedup_key(&self) -> i64 {
        *self
    }

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Int64(*self)
    }

    fn from_sql_value(value: &SqlValue) -> Result<Self, String> {
        match value {
            SqlValue::Int32(v) => Ok(i64::from(*v)),
            SqlValue::Int64(v) => Ok(*v),
            other => Err(mismatch(ColumnType::Int64, other)),
        }
    }
}

impl FilterValue for String {
    type Key = String;

    const COLUMN_TYPE: ColumnType = ColumnType::Text;

    fn dedup_key(&self) -> String {
        self.to_ascii_lowercase()
    }

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Text(self.clone())
    }

    fn from_sql_value(value: &SqlValue) -> Result<Self, String> {
        match value {
            SqlValue::Text(v) => Ok(v.clone()),
            other => Err(mismatch(ColumnType::Text, other)),
        }
    }
}

/// Bound and staged as lowercase hyphenated text. Comparisons fold case, so
/// source columns holding uppercase GUID text still match.
impl FilterValue for Uuid {
    type Key = Uuid;

    const COLUMN_TYPE: ColumnType = ColumnType::Uuid;

    fn dedup_key(&self) -> Uuid {
        *self
    }

    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Uuid(*self)
    }

    fn from_sql_value(value: &SqlValue) -> Result<Self, String> {
        match value {
            SqlValue::Uuid(v) => Ok(*v),
            SqlValue::Text(v) => Uuid::parse_str(v).map_err(|e| e.to_string()),
            other => Err(mismatch(ColumnType::Uuid, other)),
        }
    }
}
