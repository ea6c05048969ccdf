//! Adaptive value filtering
//!
//! `field IN <values>` is expressed as one of three SQL shapes depending on
//! how many distinct values there are. The shape is a cost decision only;
//! every strategy yields the same rows.

use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use crate::errors::FilterResult;
use crate::session::{Session, SessionExt};
use crate::sql::{Column, Dialect, Predicate, Query, Record};
use crate::temp_table::{with_scoped_table, VALUE_COLUMN};
use crate::value::{FilterValue, SqlValue, ValueSet};

use super::config::FilterConfig;
use super::strategy::FilterStrategy;

/// Chooses and applies a filter strategy
#[derive(Debug, Clone, Default)]
pub struct StrategySelector {
    config: FilterConfig,
}

impl StrategySelector {
    /// Creates a selector after validating `config`
    pub fn new(config: FilterConfig) -> FilterResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Bound parameters allowed in one statement on `dialect`
    pub fn parameter_ceiling(&self, dialect: &dyn Dialect) -> usize {
        self.config.max_parameters.min(dialect.max_parameters())
    }

    /// Unique staging table name, so nested filters on one session never collide
    fn staging_name(&self, marker: char) -> String {
        format!(
            "{}{}_{}",
            marker,
            self.config.temp_table_prefix,
            Uuid::new_v4().simple()
        )
    }

    /// Narrows `query` to rows whose `column` is one of `values`, then hands
    /// the filtered query to `continuation`.
    ///
    /// Values are deduplicated first. No values gives an empty source and no
    /// round-trip. One value is a bound equality. Up to the list threshold is
    /// an IN list of bound parameters. Anything larger is staged into a
    /// temporary table and joined; the table is dropped after `continuation`
    /// finishes, whatever its outcome.
    pub async fn filter_by_values<S, R, V, I, F, Fut, T>(
        &self,
        session: &S,
        query: Query<R>,
        column: Column<R, V>,
        values: I,
        cancel: &CancellationToken,
        continuation: F,
    ) -> FilterResult<T>
    where
        S: Session + Clone + 'static,
        R: Record,
        V: FilterValue,
        I: IntoIterator<Item = V>,
        F: FnOnce(Query<R>) -> Fut,
        Fut: Future<Output = FilterResult<T>>,
    {
        let values = ValueSet::new(values);
        let strategy = FilterStrategy::select(values.len(), &self.config);
        debug!(
            strategy = strategy.as_str(),
            table = query.table_name(),
            distinct_values = values.len(),
            "filter strategy selected"
        );

        match strategy {
            FilterStrategy::Empty => continuation(query.into_empty()).await,
            FilterStrategy::Equality => {
                let mut parameters = to_parameters(&values);
                match parameters.pop() {
                    Some(value) => {
                        let target = query.column(column);
                        continuation(query.filter(Predicate::equals(target, value))).await
                    }
                    None => continuation(query.into_empty()).await,
                }
            }
            FilterStrategy::Membership => {
                let ceiling = self.parameter_ceiling(session.dialect());
                let target = query.column(column);
                let predicate = Predicate::in_list(target, to_parameters(&values), ceiling);
                continuation(query.filter(predicate)).await
            }
            FilterStrategy::TempTableJoin => {
                let staging = self.staging_name(session.dialect().temp_marker());
                with_scoped_table(session, values, Some(staging.as_str()), cancel, move |table| {
                    continuation(query.join_on(table.name(), column, VALUE_COLUMN))
                })
                .await
            }
        }
    }

    /// Materializes the rows of `query` whose `column` is one of `values`
    pub async fn fetch_by_values<S, R, V, I>(
        &self,
        session: &S,
        query: Query<R>,
        column: Column<R, V>,
        values: I,
        cancel: &CancellationToken,
    ) -> FilterResult<Vec<R>>
    where
        S: Session + Clone + 'static,
        R: Record,
        V: FilterValue,
        I: IntoIterator<Item = V>,
    {
        self.filter_by_values(session, query, column, values, cancel, |filtered| async move {
            session.fetch_all(&filtered, cancel).await
        })
        .await
    }
}

fn to_parameters<V: FilterValue>(values: &ValueSet<V>) -> Vec<SqlValue> {
    values.iter().map(FilterValue::to_sql_value).collect()
}
