//! The boundary between the engine and a live server connection. The
//! introspector and verifier only ever see this trait; `mysql_adapter`
//! holds the one place that depends on the `mysql` crate directly.

use crate::error::Result;

#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Int(i64),
    UInt(u64),
    Bytes(Vec<u8>),
    Float(f64),
}

impl SqlValue {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Bytes(bytes) => std::str::from_utf8(bytes).ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::UInt(n) => Some(*n),
            Self::Int(n) => u64::try_from(*n).ok(),
            Self::Bytes(bytes) => std::str::from_utf8(bytes).ok()?.parse().ok(),
            Self::Null | Self::Float(_) => None,
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// A single result row, addressed by column name. Column order from the
/// query is preserved for adapters that need it, but callers should always
/// look columns up by name: `information_schema` query plans don't
/// guarantee column order across server versions.
#[derive(Debug, Clone, Default)]
pub struct SqlRow {
    columns: Vec<(String, SqlValue)>,
}

impl SqlRow {
    #[must_use]
    pub fn new(columns: Vec<(String, SqlValue)>) -> Self {
        Self { columns }
    }

    /// Column lookup is case-insensitive: every query in
    /// [`crate::introspect::queries`] aliases its columns in lower case, but
    /// not every driver or server collation hands them back that way, so
    /// matching is done ASCII-case-insensitively rather than relying on the
    /// wire format matching the alias literally.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.columns.iter().find(|(col, _)| col.eq_ignore_ascii_case(name)).map(|(_, value)| value)
    }

    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(SqlValue::as_str)
    }

    #[must_use]
    pub fn get_string(&self, name: &str) -> String {
        self.get_str(name).unwrap_or_default().to_string()
    }

    #[must_use]
    pub fn get_opt_string(&self, name: &str) -> Option<String> {
        match self.get(name) {
            Some(SqlValue::Null) | None => None,
            Some(value) => value.as_str().map(ToString::to_string),
        }
    }

    #[must_use]
    pub fn get_u64(&self, name: &str) -> Option<u64> {
        self.get(name).and_then(SqlValue::as_u64)
    }

    #[must_use]
    pub fn get_bool(&self, name: &str) -> bool {
        self.get_str(name).is_some_and(|s| s.eq_ignore_ascii_case("yes") || s == "1")
    }
}

/// The operations the engine needs against a live connection: running
/// read queries against `information_schema`/`SHOW CREATE`, and executing
/// DDL/DML against a (usually disposable) workspace schema for the
/// verifier.
pub trait DatabaseAdapter {
    fn query(&mut self, sql: &str) -> Result<Vec<SqlRow>>;
    fn execute(&mut self, sql: &str) -> Result<()>;
    fn server_version_comment(&mut self) -> Result<(String, String)>;
    fn current_schema(&self) -> &str;
    fn host(&self) -> &str;
}
