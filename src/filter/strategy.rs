//! Cardinality-driven strategy selection

use std::fmt;

use super::config::FilterConfig;

/// SQL shape used to express `field IN <values>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterStrategy {
    /// No values: empty source, no round-trip
    Empty,
    /// One value: `field = @p1`
    Equality,
    /// Up to the list threshold: `field IN (@p1, ...)`
    Membership,
    /// Above the threshold: inner join against a staged temporary table
    TempTableJoin,
}

impl FilterStrategy {
    /// Picks the strategy for `distinct` deduplicated values
    pub fn select(distinct: usize, config: &FilterConfig) -> Self {
        match distinct {
            0 => FilterStrategy::Empty,
            1 => FilterStrategy::Equality,
            n if n <= config.list_threshold => FilterStrategy::Membership,
            _ => FilterStrategy::TempTableJoin,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterStrategy::Empty => "empty",
            FilterStrategy::Equality => "equality",
            FilterStrategy::Membership => "membership",
            FilterStrategy::TempTableJoin => "temp_table_join",
        }
    }

    /// Whether the strategy creates, loads and drops a table
    pub fn performs_writes(&self) -> bool {
        matches!(self, FilterStrategy::TempTableJoin)
    }
}

impl fmt::Display for FilterStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
