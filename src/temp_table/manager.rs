//! Temporary table lifecycle: create, bulk-load, scoped use, drop

use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::errors::{FilterError, FilterResult};
use crate::session::Session;
use crate::value::{FilterValue, ValueSet};

use super::guard::DropGuard;
use super::name::TempTableName;
use super::row::{FieldValueRow, StagedRecord, TempTable, ValueTable};

fn resolve_name<S, R>(session: &S, table_name: Option<&str>) -> FilterResult<TempTableName>
where
    S: Session + ?Sized,
    R: StagedRecord,
{
    TempTableName::resolve(table_name, R::NAME, session.dialect().temp_marker())
}

fn value_rows<V: FilterValue>(values: impl IntoIterator<Item = V>) -> Vec<FieldValueRow<V>> {
    ValueSet::new(values).into_iter().map(FieldValueRow::new).collect()
}

async fn create<S, R>(session: &S, name: &str, cancel: &CancellationToken) -> FilterResult<()>
where
    S: Session + ?Sized,
    R: StagedRecord,
{
    let spec = R::table_spec(name);
    session.create_temp_table(&spec, cancel).await?;
    debug!(table = %name, "temporary table created");
    Ok(())
}

/// Loads the rows in one round-trip; no rows skips the call
async fn load<S, R>(
    session: &S,
    name: &str,
    rows: Vec<R>,
    cancel: &CancellationToken,
) -> FilterResult<u64>
where
    S: Session + ?Sized,
    R: StagedRecord,
{
    if rows.is_empty() {
        return Ok(0);
    }

    let rows: Vec<_> = rows.iter().map(R::to_sql_values).collect();
    let inserted = session
        .bulk_insert(name, R::COLUMNS, rows, cancel)
        .await?;
    debug!(table = %name, rows = inserted, "temporary table loaded");
    Ok(inserted)
}

/// Combines the outcome of a scope with the outcome of its cleanup drop.
///
/// A primary error always wins; a drop failure behind it is logged. A drop
/// failure after success is returned as `FilterError::Cleanup`.
pub(crate) fn settle<T>(
    table: &str,
    outcome: FilterResult<T>,
    dropped: FilterResult<()>,
) -> FilterResult<T> {
    match (outcome, dropped) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(FilterError::cleanup(table, e)),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(drop_err)) => {
            warn!(
                table = %table,
                error = %drop_err,
                "temporary table drop failed while another error was propagating"
            );
            Err(e)
        }
    }
}

/// Creates a temporary table for `R` and loads `rows` into it as given.
///
/// The table is named `table_name` (trimmed, temp marker added) or the
/// record's canonical name. No rows creates the table without a load. If
/// cancellation stops the load, the table is dropped best-effort. Any other
/// load failure leaves the table in place for the caller to drop.
pub async fn create_and_load_rows<S, R, I>(
    session: &S,
    rows: I,
    table_name: Option<&str>,
    cancel: &CancellationToken,
) -> FilterResult<TempTable<R>>
where
    S: Session + ?Sized,
    R: StagedRecord,
    I: IntoIterator<Item = R>,
{
    let name = resolve_name::<S, R>(session, table_name)?;
    let rows: Vec<R> = rows.into_iter().collect();

    create::<S, R>(session, name.as_str(), cancel).await?;

    match load(session, name.as_str(), rows, cancel).await {
        Ok(staged) => Ok(TempTable::new(name.into_string(), staged)),
        Err(e) if e.is_cancelled() => {
            let dropped = session
                .drop_temp_table(name.as_str(), true, &CancellationToken::new())
                .await;
            if let Err(drop_err) = dropped {
                warn!(table = %name, error = %drop_err, "drop after cancelled load failed");
            }
            Err(e)
        }
        Err(e) => Err(e),
    }
}

/// Creates a `FieldValueRow` table and loads the distinct `values` into it.
pub async fn create_and_load<S, V, I>(
    session: &S,
    values: I,
    table_name: Option<&str>,
    cancel: &CancellationToken,
) -> FilterResult<ValueTable<V>>
where
    S: Session + ?Sized,
    V: FilterValue,
    I: IntoIterator<Item = V>,
{
    create_and_load_rows(session, value_rows(values), table_name, cancel).await
}

/// Stages `rows`, runs `body` with the table, then drops the table.
///
/// The drop runs whether `body` succeeds, fails or is cancelled, and ignores
/// the caller's cancellation token. If the returned future is dropped before
/// completion the drop is scheduled on the runtime instead. A failed create
/// does not drop anything since the name may belong to another table.
pub async fn with_scoped_rows<S, R, I, F, Fut, T>(
    session: &S,
    rows: I,
    table_name: Option<&str>,
    cancel: &CancellationToken,
    body: F,
) -> FilterResult<T>
where
    S: Session + Clone + 'static,
    R: StagedRecord,
    I: IntoIterator<Item = R>,
    F: FnOnce(TempTable<R>) -> Fut,
    Fut: Future<Output = FilterResult<T>>,
{
    let name = resolve_name::<S, R>(session, table_name)?;
    let rows: Vec<R> = rows.into_iter().collect();

    let guard = DropGuard::arm(session, name.as_str());
    if let Err(e) = create::<S, R>(session, name.as_str(), cancel).await {
        guard.disarm();
        return Err(e);
    }

    let outcome = async {
        let staged = load(session, name.as_str(), rows, cancel).await?;
        body(TempTable::new(name.to_string(), staged)).await
    }
    .await;

    guard.disarm();
    let dropped = session
        .drop_temp_table(name.as_str(), true, &CancellationToken::new())
        .await;
    if dropped.is_ok() {
        debug!(table = %name, "temporary table dropped");
    }
    settle(name.as_str(), outcome, dropped)
}

/// Stages the distinct `values` for the duration of `body`.
///
/// Same cleanup guarantees as `with_scoped_rows`.
pub async fn with_scoped_table<S, V, I, F, Fut, T>(
    session: &S,
    values: I,
    table_name: Option<&str>,
    cancel: &CancellationToken,
    body: F,
) -> FilterResult<T>
where
    S: Session + Clone + 'static,
    V: FilterValue,
    I: IntoIterator<Item = V>,
    F: FnOnce(ValueTable<V>) -> Fut,
    Fut: Future<Output = FilterResult<T>>,
{
    with_scoped_rows(session, value_rows(values), table_name, cancel, body).await
}

/// Drops a staged table.
///
/// With `throw_if_missing` unset a missing table is not an error.
pub async fn drop_table<S, R>(
    session: &S,
    table: &TempTable<R>,
    throw_if_missing: bool,
    cancel: &CancellationToken,
) -> FilterResult<()>
where
    S: Session + ?Sized,
    R: StagedRecord,
{
    session
        .drop_temp_table(table.name(), !throw_if_missing, cancel)
        .await?;
    debug!(table = %table.name(), "temporary table dropped");
    Ok(())
}
