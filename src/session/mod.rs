//! Database sessions
//!
//! A `Session` is one logical connection. Temporary tables created through it
//! are visible only to it. Every method is one round-trip and checks the
//! cancellation token before it starts.
//!
//! `SessionExt` adds typed query execution on top of the raw round-trips; an
//! empty query source short-circuits without touching the backend.

mod row;
mod sqlite;

use futures_util::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::errors::{FilterError, FilterResult};
use crate::sql::{Column, Dialect, Query, Record, Statement, TableSpec};
use crate::value::{FilterValue, SqlValue};

pub use row::Row;
pub use sqlite::SqliteSession;

/// Cooperative cancellation checkpoint
pub fn checkpoint(cancel: &CancellationToken) -> FilterResult<()> {
    if cancel.is_cancelled() {
        return Err(FilterError::Cancelled);
    }
    Ok(())
}

/// One database session
pub trait Session: Send + Sync {
    fn dialect(&self) -> &dyn Dialect;

    /// Creates a session-scoped table
    fn create_temp_table<'a>(
        &'a self,
        spec: &'a TableSpec,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, FilterResult<()>>;

    /// Inserts all rows in a single round-trip
    fn bulk_insert<'a>(
        &'a self,
        table: &'a str,
        columns: &'a [&'a str],
        rows: Vec<Vec<SqlValue>>,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, FilterResult<u64>>;

    /// Drops a session-scoped table.
    ///
    /// With `if_exists` a missing table is not an error; without it a missing
    /// table yields `FilterError::TableNotFound`.
    fn drop_temp_table<'a>(
        &'a self,
        table: &'a str,
        if_exists: bool,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, FilterResult<()>>;

    fn query<'a>(
        &'a self,
        statement: Statement,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, FilterResult<Vec<Row>>>;

    /// Executes a statement, returning the number of affected rows
    fn execute<'a>(
        &'a self,
        statement: Statement,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, FilterResult<u64>>;
}

/// Typed execution of `Query` values
pub trait SessionExt: Session {
    /// Materializes every row of `query`
    fn fetch_all<'a, R: Record>(
        &'a self,
        query: &'a Query<R>,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, FilterResult<Vec<R>>> {
        Box::pin(async move {
            if query.is_empty() {
                return Ok(Vec::new());
            }
            let rows = self.query(query.render_select(self.dialect()), cancel).await?;
            rows.iter().map(R::from_row).collect()
        })
    }

    /// Materializes one column of `query`
    fn fetch_column<'a, R: Record, V: FilterValue>(
        &'a self,
        query: &'a Query<R>,
        column: Column<R, V>,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, FilterResult<Vec<V>>> {
        Box::pin(async move {
            if query.is_empty() {
                return Ok(Vec::new());
            }
            let statement = query.render_projection(self.dialect(), column);
            let rows = self.query(statement, cancel).await?;
            rows.iter().map(|row| row.first::<V>()).collect()
        })
    }

    fn count<'a, R: Record>(
        &'a self,
        query: &'a Query<R>,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, FilterResult<u64>> {
        Box::pin(async move {
            if query.is_empty() {
                return Ok(0);
            }
            let rows = self.query(query.render_count(self.dialect()), cancel).await?;
            let count = match rows.first() {
                Some(row) => row.first::<i64>()?,
                None => 0,
            };
            u64::try_from(count).map_err(|_| FilterError::decode("COUNT(*)", "negative count"))
        })
    }

    /// Deletes the rows matched by `query` from its source table
    fn delete<'a, R: Record>(
        &'a self,
        query: &'a Query<R>,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, FilterResult<u64>> {
        Box::pin(async move {
            if query.is_empty() {
                return Ok(0);
            }
            self.execute(query.render_delete(self.dialect()), cancel).await
        })
    }
}

impl<S: Session + ?Sized> SessionExt for S {}
