//! Value filter configuration
//!
//! Thresholds are backend heuristics. The defaults are tuned for a backend
//! with a 2100 bound-parameter ceiling; the effective ceiling for a statement
//! is the lower of `max_parameters` and the session dialect's own limit.

use serde::{Deserialize, Serialize};

use crate::errors::{FilterError, FilterResult};

/// Largest distinct-value count rendered as an IN list
pub const DEFAULT_LIST_THRESHOLD: usize = 20;

/// Bound-parameter ceiling of the reference backend
pub const DEFAULT_MAX_PARAMETERS: usize = 2100;

/// Prefix of staging table names
pub const DEFAULT_TEMP_TABLE_PREFIX: &str = "filter";

/// Strategy selection thresholds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Value counts above this use a temporary table join.
    pub list_threshold: usize,

    /// Maximum bound parameters per statement. IN-list values past this
    /// count are inlined as literals.
    pub max_parameters: usize,

    /// Staging tables are named `<marker><prefix>_<id>`.
    pub temp_table_prefix: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            list_threshold: DEFAULT_LIST_THRESHOLD,
            max_parameters: DEFAULT_MAX_PARAMETERS,
            temp_table_prefix: DEFAULT_TEMP_TABLE_PREFIX.to_string(),
        }
    }
}

impl FilterConfig {
    /// Parse from JSON; missing keys take their defaults.
    pub fn from_json(json: &str) -> FilterResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> FilterResult<()> {
        if self.list_threshold < 1 {
            return Err(FilterError::invalid_argument(
                "list_threshold",
                "must be at least 1",
            ));
        }
        if self.max_parameters < 1 {
            return Err(FilterError::invalid_argument(
                "max_parameters",
                "must be at least 1",
            ));
        }
        let prefix_ok = !self.temp_table_prefix.is_empty()
            && self
                .temp_table_prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !prefix_ok {
            return Err(FilterError::invalid_argument(
                "temp_table_prefix",
                "must be non-empty and contain only ASCII letters, digits or '_'",
            ));
        }
        Ok(())
    }
}
