//! Value Filter Tests
//!
//! Strategy selection and result equivalence against a live SQLite session:
//! - every strategy returns exactly the rows whose value is in the set
//! - statement shapes (bound equality, bound IN list, temp table join)
//! - no round-trip for an empty set, no staged table left behind

use std::fmt::Debug;

use aerofilter::filter::{FilterConfig, StrategySelector};
use aerofilter::session::{Row, Session, SessionExt, SqliteSession};
use aerofilter::sql::{Column, Query, Record, SqliteDialect, Statement};
use aerofilter::value::FilterValue;
use aerofilter::{FilterError, FilterResult};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

// =============================================================================
// Fixtures
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
struct ValueRow<V> {
    id: i64,
    value: V,
}

impl<V: FilterValue> Record for ValueRow<V> {
    const NAME: &'static str = "ValueRow";
    const COLUMNS: &'static [&'static str] = &["Id", "Value"];

    fn from_row(row: &Row) -> FilterResult<Self> {
        Ok(Self {
            id: row.get("Id")?,
            value: row.get("Value")?,
        })
    }
}

impl<V: FilterValue> ValueRow<V> {
    const VALUE: Column<Self, V> = Column::new("Value");
}

const SEEDED: i64 = 600;
const COUNTS: [usize; 7] = [0, 1, 2, 20, 21, 100, 500];

fn text_value(n: i64) -> String {
    format!("value-{}", n)
}

fn uuid_value(n: i64) -> Uuid {
    Uuid::from_u128(n as u128 * 7919)
}

async fn seeded_session() -> SqliteSession {
    let session = SqliteSession::open_in_memory().unwrap();
    let mut sql = String::from(
        "CREATE TABLE IntTable (Id INTEGER PRIMARY KEY, Value INTEGER NOT NULL);
         CREATE TABLE BigIntTable (Id INTEGER PRIMARY KEY, Value INTEGER NOT NULL);
         CREATE TABLE TextTable (Id INTEGER PRIMARY KEY, Value TEXT COLLATE NOCASE NOT NULL);
         CREATE TABLE GuidTable (Id INTEGER PRIMARY KEY, Value TEXT NOT NULL);",
    );
    for n in 1..=SEEDED {
        sql.push_str(&format!(
            "INSERT INTO IntTable (Id, Value) VALUES ({n}, {n});
             INSERT INTO BigIntTable (Id, Value) VALUES ({n}, {big});
             INSERT INTO TextTable (Id, Value) VALUES ({n}, '{text}');
             INSERT INTO GuidTable (Id, Value) VALUES ({n}, '{guid}');",
            n = n,
            big = n * 10_000_000_000,
            text = text_value(n),
            guid = uuid_value(n).hyphenated(),
        ));
    }
    session.execute_batch(sql).await.unwrap();
    session
}

async fn temp_table_count(session: &SqliteSession) -> i64 {
    let rows = session
        .query(
            Statement::raw("SELECT COUNT(*) AS n FROM sqlite_temp_master WHERE type = 'table'"),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    rows[0].get::<i64>("n").unwrap()
}

/// Filters `table` by the first `count` seeded values (plus duplicates and
/// one value that is not in the table) and checks the returned ids.
async fn assert_filter_matches<V, F>(table: &str, count: usize, make: F, candidate: fn(V) -> V)
where
    V: FilterValue + Debug,
    F: Fn(i64) -> V,
{
    let session = seeded_session().await;
    let cancel = CancellationToken::new();
    let selector = StrategySelector::default();

    let mut values: Vec<V> = (1..=count as i64).map(|n| candidate(make(n))).collect();
    values.extend((1..=(count as i64).min(3)).map(&make));
    if count > 0 {
        values.push(make(SEEDED + 1));
    }

    let rows = selector
        .fetch_by_values(
            &session,
            Query::<ValueRow<V>>::from_table(table),
            ValueRow::<V>::VALUE,
            values,
            &cancel,
        )
        .await
        .unwrap();

    let mut ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    ids.sort_unstable();
    let expected: Vec<i64> = (1..=count as i64).collect();
    assert_eq!(ids, expected, "{} filtered by {} values", table, count);
    assert_eq!(temp_table_count(&session).await, 0);
}

// =============================================================================
// Result Equivalence Across Strategies
// =============================================================================

#[tokio::test]
async fn test_int32_filter_all_cardinalities() {
    for count in COUNTS {
        assert_filter_matches("IntTable", count, |n| n as i32, |v| v).await;
    }
}

#[tokio::test]
async fn test_int64_filter_all_cardinalities() {
    for count in COUNTS {
        assert_filter_matches("BigIntTable", count, |n| n * 10_000_000_000, |v| v).await;
    }
}

/// Upper-cased candidates match lower-case rows and collapse with them.
#[tokio::test]
async fn test_text_filter_all_cardinalities() {
    for count in COUNTS {
        assert_filter_matches("TextTable", count, text_value, |v: String| v.to_uppercase()).await;
    }
}

#[tokio::test]
async fn test_uuid_filter_all_cardinalities() {
    for count in COUNTS {
        assert_filter_matches("GuidTable", count, uuid_value, |v| v).await;
    }
}

// =============================================================================
// Statement Shapes
// =============================================================================

async fn rendered_for(session: &SqliteSession, selector: &StrategySelector, values: Vec<i32>) -> Statement {
    selector
        .filter_by_values(
            session,
            Query::<ValueRow<i32>>::from_table("IntTable"),
            ValueRow::<i32>::VALUE,
            values,
            &CancellationToken::new(),
            |filtered| async move { Ok(filtered.render_select(&SqliteDialect)) },
        )
        .await
        .unwrap()
}

/// One value is a bound equality; the value never appears in the text.
#[tokio::test]
async fn test_single_value_is_bound_equality() {
    let session = seeded_session().await;
    let statement = rendered_for(&session, &StrategySelector::default(), vec![4242, 4242]).await;

    assert!(statement.sql.ends_with("WHERE t0.\"Value\" = @p1"));
    assert!(!statement.sql.contains("4242"));
    assert_eq!(statement.params.len(), 1);
}

/// Up to the threshold is an IN list with one bound parameter per value.
#[tokio::test]
async fn test_small_set_is_bound_in_list() {
    let session = seeded_session().await;
    let values: Vec<i32> = (9001..=9020).collect();
    let statement = rendered_for(&session, &StrategySelector::default(), values).await;

    assert!(statement.sql.contains("t0.\"Value\" IN (@p1, @p2,"));
    assert!(statement.sql.ends_with("@p20)"));
    assert!(!statement.sql.contains("9001"));
    assert_eq!(statement.params.len(), 20);
}

/// Above the threshold the statement joins a staged table: no parameters,
/// no NULL comparison.
#[tokio::test]
async fn test_large_set_joins_staged_table() {
    let session = seeded_session().await;
    let values: Vec<i32> = (1..=21).collect();
    let statement = rendered_for(&session, &StrategySelector::default(), values).await;

    assert!(statement
        .sql
        .contains("INNER JOIN \"#filter_"));
    assert!(statement.sql.contains("ON t0.\"Value\" = t1.\"Value\""));
    assert!(!statement.sql.to_uppercase().contains("NULL"));
    assert!(statement.params.is_empty());
    assert_eq!(temp_table_count(&session).await, 0);
}

/// Past the parameter ceiling, IN-list values are inlined and still match.
#[tokio::test]
async fn test_parameter_ceiling_inlines_excess() {
    let session = seeded_session().await;
    let selector = StrategySelector::new(FilterConfig {
        max_parameters: 3,
        ..FilterConfig::default()
    })
    .unwrap();

    let statement = rendered_for(&session, &selector, vec![1, 2, 3, 4, 5]).await;
    assert!(statement.sql.ends_with("IN (@p1, @p2, @p3, 4, 5)"));
    assert_eq!(statement.params.len(), 3);

    let rows = selector
        .fetch_by_values(
            &session,
            Query::<ValueRow<i32>>::from_table("IntTable"),
            ValueRow::<i32>::VALUE,
            vec![1, 2, 3, 4, 5],
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 5);
}

/// No values: empty source, no round-trip.
#[tokio::test]
async fn test_empty_set_needs_no_round_trip() {
    let session = seeded_session().await;
    let before = session.round_trips();

    let rows = StrategySelector::default()
        .fetch_by_values(
            &session,
            Query::<ValueRow<i32>>::from_table("IntTable"),
            ValueRow::<i32>::VALUE,
            Vec::<i32>::new(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(rows.is_empty());
    assert_eq!(session.round_trips(), before);
}

/// Equality and IN list perform no writes; the join does create, load, drop.
#[tokio::test]
async fn test_round_trips_per_strategy() {
    let session = seeded_session().await;
    let selector = StrategySelector::default();

    let before = session.round_trips();
    rendered_for(&session, &selector, vec![1, 2, 3]).await;
    assert_eq!(session.round_trips(), before);

    let before = session.round_trips();
    rendered_for(&session, &selector, (1..=50).collect()).await;
    assert_eq!(session.round_trips(), before + 3);
}

// =============================================================================
// Join Strategy End-to-End
// =============================================================================

/// IntTable 1..15, delete every even value through the joined query.
#[tokio::test]
async fn test_join_filter_then_delete_leaves_odd_rows() {
    let session = SqliteSession::open_in_memory().unwrap();
    let mut sql =
        String::from("CREATE TABLE IntTable (Id INTEGER PRIMARY KEY, Value INTEGER NOT NULL);");
    for n in 1..=15 {
        sql.push_str(&format!("INSERT INTO IntTable (Id, Value) VALUES ({n}, {n});", n = n));
    }
    session.execute_batch(sql).await.unwrap();

    let selector = StrategySelector::new(FilterConfig {
        list_threshold: 1,
        ..FilterConfig::default()
    })
    .unwrap();
    let cancel = CancellationToken::new();
    let evens: Vec<i32> = (1..=15).filter(|n| n % 2 == 0).collect();
    let (db, token) = (&session, &cancel);

    let deleted = selector
        .filter_by_values(
            &session,
            Query::<ValueRow<i32>>::from_table("IntTable"),
            ValueRow::<i32>::VALUE,
            evens,
            &cancel,
            |filtered| async move {
                assert_eq!(filtered.join_count(), 1);
                db.delete(&filtered, token).await
            },
        )
        .await
        .unwrap();
    assert_eq!(deleted, 7);

    let mut remaining = session
        .fetch_column(
            &Query::<ValueRow<i32>>::from_table("IntTable"),
            ValueRow::<i32>::VALUE,
            &cancel,
        )
        .await
        .unwrap();
    remaining.sort_unstable();
    assert_eq!(remaining, vec![1, 3, 5, 7, 9, 11, 13, 15]);
    assert_eq!(temp_table_count(&session).await, 0);
}

/// Extra caller predicates combine with the join.
#[tokio::test]
async fn test_join_composes_with_count() {
    let session = seeded_session().await;
    let cancel = CancellationToken::new();
    let (db, token) = (&session, &cancel);

    let count = StrategySelector::default()
        .filter_by_values(
            &session,
            Query::<ValueRow<i32>>::from_table("IntTable"),
            ValueRow::<i32>::VALUE,
            (100..200).collect::<Vec<i32>>(),
            &cancel,
            |filtered| async move { db.count(&filtered, token).await },
        )
        .await
        .unwrap();
    assert_eq!(count, 100);
}

// =============================================================================
// Errors and Cancellation
// =============================================================================

#[tokio::test]
async fn test_continuation_error_propagates_after_drop() {
    let session = seeded_session().await;

    let err = StrategySelector::default()
        .filter_by_values(
            &session,
            Query::<ValueRow<i32>>::from_table("IntTable"),
            ValueRow::<i32>::VALUE,
            (1..=30).collect::<Vec<i32>>(),
            &CancellationToken::new(),
            |_filtered| async { Err::<(), _>(FilterError::backend("continuation failed")) },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, FilterError::Backend(ref msg) if msg == "continuation failed"));
    assert_eq!(temp_table_count(&session).await, 0);
}

#[tokio::test]
async fn test_cancellation_during_continuation() {
    let session = seeded_session().await;
    let cancel = CancellationToken::new();
    let (db, token) = (&session, &cancel);

    let err = StrategySelector::default()
        .filter_by_values(
            &session,
            Query::<ValueRow<i32>>::from_table("IntTable"),
            ValueRow::<i32>::VALUE,
            (1..=30).collect::<Vec<i32>>(),
            &cancel,
            |filtered| async move {
                token.cancel();
                db.fetch_all(&filtered, token).await
            },
        )
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(temp_table_count(&session).await, 0);
}

#[tokio::test]
async fn test_missing_source_table_is_backend_error() {
    let session = seeded_session().await;
    let err = StrategySelector::default()
        .fetch_by_values(
            &session,
            Query::<ValueRow<i32>>::from_table("NoSuchTable"),
            ValueRow::<i32>::VALUE,
            vec![1, 2],
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, FilterError::Backend(_)));
}

// =============================================================================
// Case Folding
// =============================================================================

fn selectors() -> Vec<StrategySelector> {
    let join_always = StrategySelector::new(FilterConfig {
        list_threshold: 1,
        ..FilterConfig::default()
    })
    .unwrap();
    vec![StrategySelector::default(), join_always]
}

async fn fetch_ids<V: FilterValue>(
    session: &SqliteSession,
    selector: &StrategySelector,
    table: &str,
    values: Vec<V>,
) -> Vec<i64> {
    let rows = selector
        .fetch_by_values(
            session,
            Query::<ValueRow<V>>::from_table(table),
            ValueRow::<V>::VALUE,
            values,
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    let mut ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    ids.sort_unstable();
    ids
}

fn texts(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Non-ASCII letters differing only in case stay separate candidates and
/// each keeps its own rows.
#[tokio::test]
async fn test_non_ascii_case_variants_both_match() {
    let session = SqliteSession::open_in_memory().unwrap();
    session
        .execute_batch(
            "CREATE TABLE Accents (Id INTEGER PRIMARY KEY, Value TEXT COLLATE NOCASE NOT NULL);
             INSERT INTO Accents (Id, Value) VALUES (1, 'É'), (2, 'é'), (3, 'e');",
        )
        .await
        .unwrap();

    for selector in selectors() {
        assert_eq!(fetch_ids(&session, &selector, "Accents", texts(&["É", "é"])).await, vec![1, 2]);
        assert_eq!(fetch_ids(&session, &selector, "Accents", texts(&["É"])).await, vec![1]);
        assert_eq!(fetch_ids(&session, &selector, "Accents", texts(&["é"])).await, vec![2]);
    }
}

/// A column declared with the default binary collation still matches
/// candidates ignoring ASCII case, whichever strategy runs.
#[tokio::test]
async fn test_text_on_binary_column_ignores_case() {
    let session = SqliteSession::open_in_memory().unwrap();
    session
        .execute_batch(
            "CREATE TABLE Plain (Id INTEGER PRIMARY KEY, Value TEXT NOT NULL);
             INSERT INTO Plain (Id, Value) VALUES (1, 'a'), (2, 'A'), (3, 'b'), (4, 'c');",
        )
        .await
        .unwrap();

    for selector in selectors() {
        assert_eq!(fetch_ids(&session, &selector, "Plain", texts(&["a", "A"])).await, vec![1, 2]);
        assert_eq!(fetch_ids(&session, &selector, "Plain", texts(&["A", "B"])).await, vec![1, 2, 3]);
    }
    assert_eq!(temp_table_count(&session).await, 0);
}

/// GUIDs stored as uppercase text match the lowercase form bound for a Uuid.
#[tokio::test]
async fn test_uuid_matches_uppercase_text() {
    let session = SqliteSession::open_in_memory().unwrap();
    let ids: Vec<Uuid> = (1..=3).map(uuid_value).collect();
    let mut sql = String::from("CREATE TABLE UpperGuids (Id INTEGER PRIMARY KEY, Value TEXT NOT NULL);");
    for (n, id) in ids.iter().enumerate() {
        sql.push_str(&format!(
            "INSERT INTO UpperGuids (Id, Value) VALUES ({}, '{}');",
            n + 1,
            id.hyphenated().to_string().to_uppercase()
        ));
    }
    session.execute_batch(sql).await.unwrap();

    for selector in selectors() {
        assert_eq!(fetch_ids(&session, &selector, "UpperGuids", vec![ids[1]]).await, vec![2]);
        assert_eq!(fetch_ids(&session, &selector, "UpperGuids", ids.clone()).await, vec![1, 2, 3]);
    }
}
