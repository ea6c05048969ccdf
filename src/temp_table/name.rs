//! Temporary table naming

use std::fmt;

use crate::errors::{FilterError, FilterResult};

/// A resolved temporary table name, always carrying the temp marker
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TempTableName(String);

impl TempTableName {
    /// Resolves the name to use for a staged table.
    ///
    /// A supplied name is trimmed and must not be blank. Without one the
    /// row type's canonical name is used. The result starts with `marker`.
    pub fn resolve(custom: Option<&str>, default: &str, marker: char) -> FilterResult<Self> {
        let base = match custom {
            Some(name) => {
                let trimmed = name.trim();
                if trimmed.is_empty() {
                    return Err(FilterError::invalid_argument(
                        "table_name",
                        "must not be empty or whitespace",
                    ));
                }
                trimmed
            }
            None => default,
        };

        if base.starts_with(marker) {
            Ok(Self(base.to_string()))
        } else {
            Ok(Self(format!("{}{}", marker, base)))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for TempTableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TempTableName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
