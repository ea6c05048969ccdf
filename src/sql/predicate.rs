//! Predicate builder for value filters
//!
//! Three shapes only:
//! - `column = @p1` (equality, always a bound parameter)
//! - `column IN (@p1, @p2, ...)` (membership, literals only past the parameter ceiling)
//! - `left = right` (join key between two aliased columns)

use crate::value::SqlValue;

use super::dialect::Dialect;
use super::statement::ParameterBinder;

/// A column qualified by its table alias
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub alias: String,
    pub name: &'static str,
    /// Comparisons against this column ignore case
    pub fold_case: bool,
}

impl ColumnRef {
    pub fn new(alias: impl Into<String>, name: &'static str) -> Self {
        Self {
            alias: alias.into(),
            name,
            fold_case: false,
        }
    }

    /// The same column, compared with the dialect's case-insensitive collation
    pub fn folding_case(mut self, fold_case: bool) -> Self {
        self.fold_case = fold_case;
        self
    }

    pub fn render(&self, dialect: &dyn Dialect) -> String {
        format!("{}.{}", self.alias, dialect.quote_identifier(self.name))
    }

    /// Left-hand side of a comparison.
    ///
    /// An explicit collation on the left operand overrides whatever the
    /// column was declared with.
    fn render_compared(&self, dialect: &dyn Dialect, fold_case: bool) -> String {
        if fold_case {
            format!(
                "{} COLLATE {}",
                self.render(dialect),
                dialect.case_insensitive_collation()
            )
        } else {
            self.render(dialect)
        }
    }
}

/// Right-hand side value of a predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Supplied out-of-band as a bound parameter
    Param(SqlValue),
    /// Inlined into the statement text
    Literal(SqlValue),
}

impl Operand {
    pub fn is_param(&self) -> bool {
        matches!(self, Operand::Param(_))
    }

    fn render(&self, dialect: &dyn Dialect, binder: &mut ParameterBinder<'_>) -> String {
        match self {
            Operand::Param(value) => binder.bind(value.clone()),
            Operand::Literal(value) => dialect.literal(value),
        }
    }
}

/// Filter predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Equals { column: ColumnRef, operand: Operand },
    In { column: ColumnRef, operands: Vec<Operand> },
    ColumnEquals { left: ColumnRef, right: ColumnRef },
}

impl Predicate {
    /// `column = @p`
    pub fn equals(column: ColumnRef, value: SqlValue) -> Self {
        Predicate::Equals {
            column,
            operand: Operand::Param(value),
        }
    }

    /// `column IN (...)` with one parameter per value.
    ///
    /// The first `max_parameters` values are bound; any excess is inlined so
    /// the statement stays under the backend ceiling.
    pub fn in_list(column: ColumnRef, values: Vec<SqlValue>, max_parameters: usize) -> Self {
        let operands = values
            .into_iter()
            .enumerate()
            .map(|(i, value)| {
                if i < max_parameters {
                    Operand::Param(value)
                } else {
                    Operand::Literal(value)
                }
            })
            .collect();
        Predicate::In { column, operands }
    }

    /// `left = right`
    pub fn column_equals(left: ColumnRef, right: ColumnRef) -> Self {
        Predicate::ColumnEquals { left, right }
    }

    /// Number of bound parameters this predicate will emit
    pub fn parameter_count(&self) -> usize {
        match self {
            Predicate::Equals { operand, .. } => usize::from(operand.is_param()),
            Predicate::In { operands, .. } => operands.iter().filter(|o| o.is_param()).count(),
            Predicate::ColumnEquals { .. } => 0,
        }
    }

    pub fn render(&self, dialect: &dyn Dialect, binder: &mut ParameterBinder<'_>) -> String {
        match self {
            Predicate::Equals { column, operand } => {
                format!(
                    "{} = {}",
                    column.render_compared(dialect, column.fold_case),
                    operand.render(dialect, binder)
                )
            }
            // IN () is not valid SQL
            Predicate::In { operands, .. } if operands.is_empty() => "1 = 0".to_string(),
            Predicate::In { column, operands } => {
                let items: Vec<String> = operands
                    .iter()
                    .map(|o| o.render(dialect, binder))
                    .collect();
                format!(
                    "{} IN ({})",
                    column.render_compared(dialect, column.fold_case),
                    items.join(", ")
                )
            }
            Predicate::ColumnEquals { left, right } => {
                let fold_case = left.fold_case || right.fold_case;
                format!(
                    "{} = {}",
                    left.render_compared(dialect, fold_case),
                    right.render(dialect)
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::dialect::SqliteDialect;

    fn render(predicate: &Predicate) -> (String, usize) {
        let dialect = SqliteDialect;
        let mut binder = ParameterBinder::new(&dialect);
        let sql = predicate.render(&dialect, &mut binder);
        let statement = binder.into_statement(sql);
        (statement.sql, statement.params.len())
    }

    #[test]
    fn test_equality_is_parameterized() {
        let column = ColumnRef::new("t0", "Value");
        let predicate = Predicate::equals(column, SqlValue::Text("testValue".into()));
        let (sql, params) = render(&predicate);
        assert_eq!(sql, "t0.\"Value\" = @p1");
        assert_eq!(params, 1);
        assert!(!sql.contains("testValue"));
    }

    #[test]
    fn test_membership_is_parameterized() {
        let column = ColumnRef::new("t0", "Value");
        let values = vec![SqlValue::Int32(1), SqlValue::Int32(2), SqlValue::Int32(3)];
        let predicate = Predicate::in_list(column, values, 2100);
        let (sql, params) = render(&predicate);
        assert_eq!(sql, "t0.\"Value\" IN (@p1, @p2, @p3)");
        assert_eq!(params, 3);
    }

    #[test]
    fn test_membership_inlines_excess_over_ceiling() {
        let column = ColumnRef::new("t0", "Value");
        let values = vec![
            SqlValue::Text("a".into()),
            SqlValue::Text("b".into()),
            SqlValue::Text("c'd".into()),
        ];
        let predicate = Predicate::in_list(column, values, 2);
        assert_eq!(predicate.parameter_count(), 2);
        let (sql, params) = render(&predicate);
        assert_eq!(sql, "t0.\"Value\" IN (@p1, @p2, 'c''d')");
        assert_eq!(params, 2);
    }

    #[test]
    fn test_empty_membership_matches_nothing() {
        let predicate = Predicate::in_list(ColumnRef::new("t0", "Value"), Vec::new(), 10);
        let (sql, params) = render(&predicate);
        assert_eq!(sql, "1 = 0");
        assert_eq!(params, 0);
    }

    #[test]
    fn test_case_folding_column_is_collated() {
        let column = ColumnRef::new("t0", "Value").folding_case(true);
        let (sql, _) = render(&Predicate::equals(column.clone(), SqlValue::Text("a".into())));
        assert_eq!(sql, "t0.\"Value\" COLLATE NOCASE = @p1");

        let values = vec![SqlValue::Text("a".into()), SqlValue::Text("b".into())];
        let (sql, _) = render(&Predicate::in_list(column.clone(), values, 10));
        assert_eq!(sql, "t0.\"Value\" COLLATE NOCASE IN (@p1, @p2)");

        let (sql, _) = render(&Predicate::column_equals(column, ColumnRef::new("t1", "Value")));
        assert_eq!(sql, "t0.\"Value\" COLLATE NOCASE = t1.\"Value\"");
    }

    #[test]
    fn test_join_key_has_no_null_comparison() {
        let predicate = Predicate::column_equals(
            ColumnRef::new("t0", "Value"),
            ColumnRef::new("t1", "Value"),
        );
        let (sql, _) = render(&predicate);
        assert_eq!(sql, "t0.\"Value\" = t1.\"Value\"");
        assert!(!sql.to_uppercase().contains("NULL"));
    }
}
