//! Typed façade over the generic staging and filtering operations
//!
//! Fixes the value type to one of the supported scalars (`i32`, `i64`,
//! `String`, `Uuid`) so call sites never spell out `FieldValueRow<V>`.
//! Text deduplicates case-insensitively; the others compare exactly.
//! The `*_nullable` variants accept `Option<V>` and drop `None` before
//! staging.

use std::future::Future;

use futures_util::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::errors::FilterResult;
use crate::filter::StrategySelector;
use crate::session::Session;
use crate::sql::{Column, Query, Record};
use crate::temp_table::{self, ValueTable};
use crate::value::{FilterValue, ValueSet};

mod sealed {
    pub trait Sealed {}

    impl Sealed for i32 {}
    impl Sealed for i64 {}
    impl Sealed for String {}
    impl Sealed for uuid::Uuid {}
}

/// Scalar types accepted by the typed façade
pub trait Scalar: FilterValue + sealed::Sealed {}

impl Scalar for i32 {}
impl Scalar for i64 {}
impl Scalar for String {}
impl Scalar for Uuid {}

/// Temporary table staging for scalar values
pub trait TypedTempTables: Session + Clone + 'static {
    fn create_and_load_values<'a, V, I>(
        &'a self,
        values: I,
        table_name: Option<&'a str>,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, FilterResult<ValueTable<V>>>
    where
        V: Scalar,
        I: IntoIterator<Item = V> + Send + 'a,
    {
        Box::pin(temp_table::create_and_load(self, values, table_name, cancel))
    }

    fn create_and_load_nullable<'a, V, I>(
        &'a self,
        values: I,
        table_name: Option<&'a str>,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, FilterResult<ValueTable<V>>>
    where
        V: Scalar,
        I: IntoIterator<Item = Option<V>> + Send + 'a,
    {
        let values = ValueSet::from_nullable(values);
        Box::pin(temp_table::create_and_load(self, values, table_name, cancel))
    }

    fn with_scoped_values<'a, V, I, F, Fut, T>(
        &'a self,
        values: I,
        table_name: Option<&'a str>,
        cancel: &'a CancellationToken,
        body: F,
    ) -> BoxFuture<'a, FilterResult<T>>
    where
        V: Scalar,
        I: IntoIterator<Item = V> + Send + 'a,
        F: FnOnce(ValueTable<V>) -> Fut + Send + 'a,
        Fut: Future<Output = FilterResult<T>> + Send + 'a,
        T: Send + 'a,
    {
        Box::pin(temp_table::with_scoped_table(
            self, values, table_name, cancel, body,
        ))
    }

    fn with_scoped_nullable<'a, V, I, F, Fut, T>(
        &'a self,
        values: I,
        table_name: Option<&'a str>,
        cancel: &'a CancellationToken,
        body: F,
    ) -> BoxFuture<'a, FilterResult<T>>
    where
        V: Scalar,
        I: IntoIterator<Item = Option<V>> + Send + 'a,
        F: FnOnce(ValueTable<V>) -> Fut + Send + 'a,
        Fut: Future<Output = FilterResult<T>> + Send + 'a,
        T: Send + 'a,
    {
        let values = ValueSet::from_nullable(values);
        Box::pin(temp_table::with_scoped_table(
            self, values, table_name, cancel, body,
        ))
    }
}

impl<S: Session + Clone + 'static> TypedTempTables for S {}

/// Value filtering by scalar values with the default thresholds
pub trait TypedValueFilter: Session + Clone + 'static {
    fn filter_values<'a, R, V, I, F, Fut, T>(
        &'a self,
        query: Query<R>,
        column: Column<R, V>,
        values: I,
        cancel: &'a CancellationToken,
        continuation: F,
    ) -> BoxFuture<'a, FilterResult<T>>
    where
        R: Record,
        V: Scalar,
        I: IntoIterator<Item = V> + Send + 'a,
        F: FnOnce(Query<R>) -> Fut + Send + 'a,
        Fut: Future<Output = FilterResult<T>> + Send + 'a,
        T: Send + 'a,
    {
        Box::pin(async move {
            StrategySelector::default()
                .filter_by_values(self, query, column, values, cancel, continuation)
                .await
        })
    }

    fn filter_nullable<'a, R, V, I, F, Fut, T>(
        &'a self,
        query: Query<R>,
        column: Column<R, V>,
        values: I,
        cancel: &'a CancellationToken,
        continuation: F,
    ) -> BoxFuture<'a, FilterResult<T>>
    where
        R: Record,
        V: Scalar,
        I: IntoIterator<Item = Option<V>> + Send + 'a,
        F: FnOnce(Query<R>) -> Fut + Send + 'a,
        Fut: Future<Output = FilterResult<T>> + Send + 'a,
        T: Send + 'a,
    {
        let values = ValueSet::from_nullable(values);
        self.filter_values(query, column, values, cancel, continuation)
    }

    fn fetch_values<'a, R, V, I>(
        &'a self,
        query: Query<R>,
        column: Column<R, V>,
        values: I,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, FilterResult<Vec<R>>>
    where
        R: Record,
        V: Scalar,
        I: IntoIterator<Item = V> + Send + 'a,
    {
        Box::pin(async move {
            StrategySelector::default()
                .fetch_by_values(self, query, column, values, cancel)
                .await
        })
    }
}

impl<S: Session + Clone + 'static> TypedValueFilter for S {}
