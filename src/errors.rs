//! Error types for value filtering and temporary tables
//!
//! Error codes:
//! - AERO_FILTER_INVALID_ARGUMENT (REJECT)
//! - AERO_FILTER_BACKEND (ERROR)
//! - AERO_FILTER_TABLE_NOT_FOUND (ERROR)
//! - AERO_FILTER_CLEANUP (ERROR)
//! - AERO_FILTER_CANCELLED (CANCELLED)
//! - AERO_FILTER_DECODE (ERROR)
//! - AERO_FILTER_HARNESS (ERROR)

use std::fmt;

use thiserror::Error;

/// Severity levels for filter errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Request rejected before any round-trip
    Reject,
    /// Round-trip or cleanup failed
    Error,
    /// Caller asked to stop
    Cancelled,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Error => write!(f, "ERROR"),
            Severity::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Stable error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterErrorCode {
    AeroFilterInvalidArgument,
    AeroFilterBackend,
    AeroFilterTableNotFound,
    AeroFilterCleanup,
    AeroFilterCancelled,
    AeroFilterDecode,
    AeroFilterHarness,
}

impl FilterErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            FilterErrorCode::AeroFilterInvalidArgument => "AERO_FILTER_INVALID_ARGUMENT",
            FilterErrorCode::AeroFilterBackend => "AERO_FILTER_BACKEND",
            FilterErrorCode::AeroFilterTableNotFound => "AERO_FILTER_TABLE_NOT_FOUND",
            FilterErrorCode::AeroFilterCleanup => "AERO_FILTER_CLEANUP",
            FilterErrorCode::AeroFilterCancelled => "AERO_FILTER_CANCELLED",
            FilterErrorCode::AeroFilterDecode => "AERO_FILTER_DECODE",
            FilterErrorCode::AeroFilterHarness => "AERO_FILTER_HARNESS",
        }
    }

    /// Returns the severity level for this code
    pub fn severity(&self) -> Severity {
        match self {
            FilterErrorCode::AeroFilterInvalidArgument => Severity::Reject,
            FilterErrorCode::AeroFilterCancelled => Severity::Cancelled,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for FilterErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors raised while staging values or filtering by them
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Invalid argument '{argument}': {reason}")]
    InvalidArgument { argument: &'static str, reason: String },

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Failed to drop temporary table {table}: {source}")]
    Cleanup {
        table: String,
        #[source]
        source: Box<FilterError>,
    },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Cannot decode column '{column}': {reason}")]
    Decode { column: String, reason: String },

    #[error("Harness error: {0}")]
    Harness(String),
}

impl FilterError {
    /// Create an invalid argument error
    pub fn invalid_argument(argument: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument,
            reason: reason.into(),
        }
    }

    /// Create a backend error
    pub fn backend(reason: impl Into<String>) -> Self {
        Self::Backend(reason.into())
    }

    /// Create a decode error
    pub fn decode(column: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            reason: reason.into(),
        }
    }

    /// Create a harness error
    pub fn harness(reason: impl Into<String>) -> Self {
        Self::Harness(reason.into())
    }

    /// Wrap a failed drop
    pub fn cleanup(table: impl Into<String>, source: FilterError) -> Self {
        Self::Cleanup {
            table: table.into(),
            source: Box::new(source),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> FilterErrorCode {
        match self {
            Self::InvalidArgument { .. } => FilterErrorCode::AeroFilterInvalidArgument,
            Self::Backend(_) => FilterErrorCode::AeroFilterBackend,
            Self::TableNotFound(_) => FilterErrorCode::AeroFilterTableNotFound,
            Self::Cleanup { .. } => FilterErrorCode::AeroFilterCleanup,
            Self::Cancelled => FilterErrorCode::AeroFilterCancelled,
            Self::Decode { .. } => FilterErrorCode::AeroFilterDecode,
            Self::Harness(_) => FilterErrorCode::AeroFilterHarness,
        }
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code().severity()
    }

    /// Returns true when the caller's cancellation signal stopped the operation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<rusqlite::Error> for FilterError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Backend(e.to_string())
    }
}

impl From<serde_json::Error> for FilterError {
    fn from(e: serde_json::Error) -> Self {
        Self::invalid_argument("config", e.to_string())
    }
}

/// Result type for filter operations
pub type FilterResult<T> = Result<T, FilterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            FilterError::invalid_argument("name", "blank").code().code(),
            "AERO_FILTER_INVALID_ARGUMENT"
        );
        assert_eq!(FilterError::Cancelled.code().code(), "AERO_FILTER_CANCELLED");
        assert_eq!(
            FilterError::backend("boom").code().code(),
            "AERO_FILTER_BACKEND"
        );
    }

    #[test]
    fn test_cancellation_is_distinct_from_backend() {
        assert!(FilterError::Cancelled.is_cancelled());
        assert!(!FilterError::backend("connection reset").is_cancelled());
        assert_eq!(FilterError::Cancelled.severity(), Severity::Cancelled);
        assert_eq!(FilterError::backend("x").severity(), Severity::Error);
    }

    #[test]
    fn test_cleanup_keeps_source() {
        let err = FilterError::cleanup("#filter", FilterError::backend("locked"));
        let display = err.to_string();
        assert!(display.contains("#filter"));
        assert!(display.contains("locked"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
