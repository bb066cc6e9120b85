use std::borrow::Cow;
use std::fmt;

use pg_escape::{quote_identifier, quote_literal};

/// Name of a warehouse table, resolved through the session's `search_path`.
#[derive(Debug, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TableName(String);

impl TableName {
    /// Creates a new [`TableName`].
    pub fn new(name: impl Into<String>) -> TableName {
        Self(name.into())
    }

    /// Returns the unquoted name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the name as a SQL identifier, quoted only when it collides with a keyword or
    /// contains characters that need quoting.
    pub fn as_quoted_identifier(&self) -> Cow<'_, str> {
        quote_identifier(&self.0)
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TableName {
    fn from(name: &str) -> Self {
        TableName::new(name)
    }
}

/// Quotes a column name for use in SQL text.
pub fn quote_column(name: &str) -> Cow<'_, str> {
    quote_identifier(name)
}

/// Quotes a value as a SQL string literal.
pub fn quote_value(value: &str) -> String {
    quote_literal(value)
}
