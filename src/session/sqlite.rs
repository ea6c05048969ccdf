//! SQLite session backed by `rusqlite`
//!
//! One `SqliteSession` owns one connection, so `CREATE TEMP TABLE` is scoped
//! to it. Round-trips run on the blocking pool; the connection mutex keeps
//! them strictly sequential.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::future::BoxFuture;
use rusqlite::types::{ToSqlOutput, Value, ValueRef};
use rusqlite::{params_from_iter, Connection, ToSql};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::errors::{FilterError, FilterResult};
use crate::sql::{Dialect, SqliteDialect, Statement, TableSpec};
use crate::value::SqlValue;

use super::{checkpoint, Row, Session};

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Null => ToSqlOutput::Owned(Value::Null),
            SqlValue::Int32(v) => ToSqlOutput::Owned(Value::Integer(i64::from(*v))),
            SqlValue::Int64(v) => ToSqlOutput::Owned(Value::Integer(*v)),
            SqlValue::Text(v) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
            SqlValue::Uuid(v) => ToSqlOutput::Owned(Value::Text(v.hyphenated().to_string())),
        })
    }
}

fn decode(column: &str, value: Value) -> FilterResult<SqlValue> {
    match value {
        Value::Null => Ok(SqlValue::Null),
        Value::Integer(v) => Ok(SqlValue::Int64(v)),
        Value::Text(v) => Ok(SqlValue::Text(v)),
        Value::Blob(bytes) => uuid::Uuid::from_slice(&bytes)
            .map(SqlValue::Uuid)
            .map_err(|e| FilterError::decode(column, e.to_string())),
        Value::Real(_) => Err(FilterError::decode(column, "real values are not supported")),
    }
}

fn is_missing_table(error: &rusqlite::Error) -> bool {
    match error {
        rusqlite::Error::SqliteFailure(_, Some(message)) => message.starts_with("no such table"),
        _ => false,
    }
}

fn bind_named<'s>(statement: &'s Statement) -> Vec<(&'s str, &'s dyn ToSql)> {
    statement
        .params
        .iter()
        .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
        .collect()
}

/// A single SQLite connection used as a database session
#[derive(Clone)]
pub struct SqliteSession {
    connection: Arc<Mutex<Connection>>,
    dialect: SqliteDialect,
    round_trips: Arc<AtomicU64>,
}

impl SqliteSession {
    /// Opens a private in-memory database
    pub fn open_in_memory() -> FilterResult<Self> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    /// Opens (or creates) a database file
    pub fn open(path: impl AsRef<Path>) -> FilterResult<Self> {
        Ok(Self::from_connection(Connection::open(path)?))
    }

    pub fn from_connection(connection: Connection) -> Self {
        Self {
            connection: Arc::new(Mutex::new(connection)),
            dialect: SqliteDialect,
            round_trips: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Number of round-trips performed so far
    pub fn round_trips(&self) -> u64 {
        self.round_trips.load(Ordering::SeqCst)
    }

    /// Runs a batch of raw SQL (schema setup, seeding)
    pub async fn execute_batch(&self, sql: impl Into<String>) -> FilterResult<()> {
        let sql = sql.into();
        self.run(&CancellationToken::new(), move |conn| {
            conn.execute_batch(&sql)?;
            Ok(())
        })
        .await
    }

    /// Returns true if a temporary table named `name` exists in this session
    pub async fn temp_table_exists(&self, name: &str) -> FilterResult<bool> {
        let name = name.to_string();
        self.run(&CancellationToken::new(), move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM sqlite_temp_master WHERE type = 'table' AND name = ?1",
                [name.as_str()],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
        .await
    }

    async fn run<T, F>(&self, cancel: &CancellationToken, work: F) -> FilterResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> FilterResult<T> + Send + 'static,
    {
        checkpoint(cancel)?;
        self.round_trips.fetch_add(1, Ordering::SeqCst);
        let connection = Arc::clone(&self.connection);
        tokio::task::spawn_blocking(move || {
            let mut guard = connection
                .lock()
                .map_err(|_| FilterError::backend("session connection mutex poisoned"))?;
            work(&mut guard)
        })
        .await
        .map_err(|e| FilterError::backend(format!("session task failed: {}", e)))?
    }
}

impl Session for SqliteSession {
    fn dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    fn create_temp_table<'a>(
        &'a self,
        spec: &'a TableSpec,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, FilterResult<()>> {
        let sql = self.dialect.create_temp_table(spec);
        Box::pin(async move {
            debug!(table = %spec.name, "creating temporary table");
            self.run(cancel, move |conn| {
                conn.execute(&sql, [])?;
                Ok(())
            })
            .await
        })
    }

    fn bulk_insert<'a>(
        &'a self,
        table: &'a str,
        columns: &'a [&'a str],
        rows: Vec<Vec<SqlValue>>,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, FilterResult<u64>> {
        let column_list: Vec<String> = columns
            .iter()
            .map(|c| self.dialect.quote_identifier(c))
            .collect();
        let markers: Vec<String> = (1..=columns.len())
            .map(|i| self.dialect.parameter_marker(i))
            .collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.dialect.quote_identifier(table),
            column_list.join(", "),
            markers.join(", ")
        );
        Box::pin(async move {
            self.run(cancel, move |conn| {
                let tx = conn.transaction()?;
                let mut inserted = 0u64;
                {
                    let mut insert = tx.prepare(&sql)?;
                    for row in &rows {
                        inserted += insert.execute(params_from_iter(row.iter()))? as u64;
                    }
                }
                tx.commit()?;
                Ok(inserted)
            })
            .await
        })
    }

    fn drop_temp_table<'a>(
        &'a self,
        table: &'a str,
        if_exists: bool,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, FilterResult<()>> {
        let sql = self.dialect.drop_temp_table(table, if_exists);
        let name = table.to_string();
        Box::pin(async move {
            self.run(cancel, move |conn| match conn.execute(&sql, []) {
                Ok(_) => Ok(()),
                Err(e) if is_missing_table(&e) => Err(FilterError::TableNotFound(name)),
                Err(e) => Err(e.into()),
            })
            .await
        })
    }

    fn query<'a>(
        &'a self,
        statement: Statement,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, FilterResult<Vec<Row>>> {
        Box::pin(async move {
            self.run(cancel, move |conn| {
                let mut prepared = conn.prepare(&statement.sql)?;
                let columns: Arc<[String]> = prepared
                    .column_names()
                    .into_iter()
                    .map(String::from)
                    .collect::<Vec<_>>()
                    .into();
                let params = bind_named(&statement);
                let mut rows = prepared.query(params.as_slice())?;

                let mut out = Vec::new();
                while let Some(row) = rows.next()? {
                    let mut values = Vec::with_capacity(columns.len());
                    for (i, column) in columns.iter().enumerate() {
                        let value: Value = row.get(i)?;
                        values.push(decode(column, value)?);
                    }
                    out.push(Row::new(Arc::clone(&columns), values));
                }
                Ok(out)
            })
            .await
        })
    }

    fn execute<'a>(
        &'a self,
        statement: Statement,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, FilterResult<u64>> {
        Box::pin(async move {
            self.run(cancel, move |conn| {
                let mut prepared = conn.prepare(&statement.sql)?;
                let params = bind_named(&statement);
                let affected = prepared.execute(params.as_slice())?;
                Ok(affected as u64)
            })
            .await
        })
    }
}
