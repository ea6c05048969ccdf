//! Rendered statements and parameter collection

use crate::value::SqlValue;

use super::dialect::Dialect;

/// SQL text plus its out-of-band parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<(String, SqlValue)>,
}

impl Statement {
    /// A statement without parameters
    pub fn raw(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn parameter_count(&self) -> usize {
        self.params.len()
    }
}

/// Hands out parameter markers in order of appearance
pub struct ParameterBinder<'d> {
    dialect: &'d dyn Dialect,
    params: Vec<(String, SqlValue)>,
}

impl<'d> ParameterBinder<'d> {
    pub fn new(dialect: &'d dyn Dialect) -> Self {
        Self {
            dialect,
            params: Vec::new(),
        }
    }

    /// Registers a value and returns the marker to place in the text
    pub fn bind(&mut self, value: SqlValue) -> String {
        let marker = self.dialect.parameter_marker(self.params.len() + 1);
        self.params.push((marker.clone(), value));
        marker
    }

    pub fn into_statement(self, sql: String) -> Statement {
        Statement {
            sql,
            params: self.params,
        }
    }
}
