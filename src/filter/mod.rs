//! Adaptive filtering of a query by a set of candidate values

mod config;
mod selector;
mod strategy;

pub use config::{
    FilterConfig, DEFAULT_LIST_THRESHOLD, DEFAULT_MAX_PARAMETERS, DEFAULT_TEMP_TABLE_PREFIX,
};
pub use selector::StrategySelector;
pub use strategy::FilterStrategy;
