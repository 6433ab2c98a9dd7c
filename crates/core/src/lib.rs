//! `schemasync_core`: declarative schema introspection and diffing for the
//! MySQL server family (MySQL, Percona Server, MariaDB).
//!
//! The four operations a caller composes are [`introspect_schema`],
//! [`diff_schemas`], [`format_diff`], and [`verify_diff`] — deliberately
//! separate rather than one `run()` entry point, so a caller can introspect
//! once and diff against several target schemas, or format without ever
//! touching a live connection.

mod adapter;
mod config;
mod diff;
mod error;
mod flavor;
mod format;
mod generator;
mod introspect;
mod lint;
mod mysql_adapter;
mod quoting;
mod schema;
mod types;
mod verify;

pub use adapter::{DatabaseAdapter, SqlRow, SqlValue};
pub use config::{ConnectionConfig, DiffConfig};
pub use diff::clause::AlterClause;
pub use diff::schema::{ObjectDiff, SchemaDiff};
pub use error::{
    ConnectError, Error, GenerateError, IntrospectionError, PermissionError, Result, UnsupportedFeatureError,
    VerificationError,
};
pub use flavor::{Flavor, Vendor};
pub use format::{NextAutoIncrementMode, PartitioningModifier, RenderedStatement, StatementModifiers};
pub use lint::{lint_schema, LintFinding, LintSeverity};
pub use mysql_adapter::MysqlAdapter;
pub use quoting::{escape_identifier, escape_literal, quote_literal};
pub use schema::{
    Column, ColumnDefault, ForeignKey, GeneratedExpr, Index, IndexPart, IndexType, PartitionDef, PartitionMethod,
    PartitionRenderMode, Partitioning, ReferentialAction, Routine, RoutineKind, Schema, Table,
};
pub use types::{
    charset_change_is_unsafe, modify_column_type_is_unsafe, parse as parse_column_type, strip_int_display_width,
    ParsedType,
};

/// Populates a [`Schema`] from `adapter.current_schema()`.
pub fn introspect_schema(adapter: &mut dyn DatabaseAdapter, flavor: Flavor) -> Result<Schema> {
    introspect::introspect_schema(adapter, flavor)
}

/// Introspects several independent connections concurrently, bounded by
/// `config.concurrent_instances`. Each entry in `connect` is called on its
/// own worker thread to obtain an adapter (e.g. opening a fresh pooled
/// connection), which is then introspected and dropped. Results are
/// returned in the same order as `connect`.
pub fn introspect_many<F>(connect: Vec<F>, flavor: Flavor, config: &DiffConfig) -> Vec<Result<Schema>>
where
    F: FnOnce() -> Result<Box<dyn DatabaseAdapter>> + Send,
{
    introspect::introspect_many(connect, flavor, config)
}

/// Computes the ordered set of changes that would turn `old` into `new`.
#[must_use]
pub fn diff_schemas(old: &Schema, new: &Schema, flavor: Flavor) -> SchemaDiff {
    diff::schema::diff_schemas(old, new, flavor)
}

/// Renders a [`SchemaDiff`] into executable (or commented-out, for
/// suppressed unsafe changes) DDL text.
#[must_use]
pub fn format_diff(diff: &SchemaDiff, flavor: Flavor, modifiers: &StatementModifiers) -> Vec<RenderedStatement> {
    format::format_diff(diff, flavor, modifiers)
}

/// Replays `statements` against `adapter`'s current (workspace) schema and
/// confirms the result matches `expected` byte-for-byte.
pub fn verify_diff(
    adapter: &mut dyn DatabaseAdapter,
    statements: &[RenderedStatement],
    expected: &Schema,
    flavor: Flavor,
) -> Result<()> {
    verify::verify_schema_diff(adapter, statements, expected, flavor)
}
