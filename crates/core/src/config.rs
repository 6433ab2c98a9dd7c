//! Connection and diff-run configuration. Kept free of any `mysql`-crate
//! types so it can be constructed and unit-tested without a live server.

use std::collections::BTreeMap;

use crate::format::StatementModifiers;
use crate::lint::LintSeverity;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub socket: Option<String>,
    pub extra_params: BTreeMap<String, String>,
}

pub const DEFAULT_MYSQL_HOST: &str = "127.0.0.1";
pub const DEFAULT_MYSQL_PORT: u16 = 3306;
pub const MINIMUM_MYSQL_MAJOR_VERSION: u16 = 5;

impl ConnectionConfig {
    #[must_use]
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            host: DEFAULT_MYSQL_HOST.to_string(),
            port: DEFAULT_MYSQL_PORT,
            user: "root".to_string(),
            password: String::new(),
            database: database.into(),
            socket: None,
            extra_params: BTreeMap::new(),
        }
    }
}

/// Tunables for a schema-diff run across one or more flavors/instances.
///
/// `concurrent_instances` bounds how many schemas are introspected at once
/// within a single call to [`crate::introspect_many`] — each instance gets
/// its own connection, so this genuinely runs introspection in parallel.
///
/// `concurrent_servers` bounds parallelism across distinct server *flavors*
/// (e.g. running the same migration against MySQL 8 and MariaDB 10 at
/// once). That fan-out lives one layer up, in whatever orchestrates several
/// `DiffConfig` runs side by side (a CLI, a CI job) — this crate only
/// introspects/diffs one flavor per call, so the field is carried here as
/// shared policy but isn't read by anything in this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffConfig {
    pub concurrent_servers: usize,
    pub concurrent_instances: usize,
    pub allow_unsafe: bool,
    pub verify: bool,
    pub statement_modifiers: StatementModifiers,
    pub lint_severity_overrides: BTreeMap<String, LintSeverity>,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            concurrent_servers: 1,
            concurrent_instances: 1,
            allow_unsafe: false,
            verify: true,
            statement_modifiers: StatementModifiers::default(),
            lint_severity_overrides: BTreeMap::new(),
        }
    }
}
