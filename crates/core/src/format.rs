//! C9: turns a [`SchemaDiff`] into actual DDL text, gated by
//! [`StatementModifiers`]. This is the only place that decides whether an
//! unsafe clause is actually allowed to reach the output.

use crate::diff::clause::AlterClause;
use crate::diff::schema::{ObjectDiff, SchemaDiff};
use crate::flavor::Flavor;
use crate::generator::generate_create_table;
use crate::quoting::escape_identifier;
use crate::schema::{ForeignKey, Index, IndexPart, IndexType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextAutoIncrementMode {
    /// Never render `AUTO_INCREMENT=N` changes.
    Never,
    /// Render only when the new value is higher than the old one (the
    /// default: lowering it is meaningless, MySQL ignores it).
    IfIncreased,
    /// Always render the clause the differ produced.
    Always,
}

impl Default for NextAutoIncrementMode {
    fn default() -> Self {
        Self::IfIncreased
    }
}

/// How `StatementModifiers` treats partitioning clauses: `Keep` drops them
/// from the rendered statement entirely (the operator manages partitioning
/// out of band), `RemoveOnly` lets through only `RemovePartitioning`/
/// `DropPartitionList`, `Modify` (the default) lets everything through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitioningModifier {
    Keep,
    RemoveOnly,
    Modify,
}

impl Default for PartitioningModifier {
    fn default() -> Self {
        Self::Modify
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementModifiers {
    pub allow_unsafe: bool,
    pub next_auto_increment: NextAutoIncrementMode,
    /// Suppress a `ModifyColumn` clause whose only difference from the old
    /// definition is its declared position (`positional_only`).
    pub lax_column_order: bool,
    /// Suppress a table's `ChangeComment` clause when at least one other
    /// substantive clause is already present in the same `ALTER TABLE`.
    pub lax_comments: bool,
    pub partitioning: PartitioningModifier,
    /// When `false`, a `DropIndex`+`AddIndex` pair that differs only in key
    /// part order is suppressed. Currently a no-op: the differ doesn't
    /// track index-declaration-order-only changes as a distinct clause, so
    /// there is nothing yet for this knob to suppress; kept for parity with
    /// the full modifier set and to gate that behavior once it exists.
    pub strict_index_order: bool,
    /// When `false`, a `DropForeignKey`+`AddForeignKey` pair representing a
    /// pure rename (every field but the name is identical) is suppressed.
    pub strict_foreign_key_naming: bool,
    /// Appended to the statement as `ALGORITHM={value}`.
    pub algorithm: Option<String>,
    /// Appended to the statement as `LOCK={value}`.
    pub lock_level: Option<String>,
    /// Appended as `WITH VALIDATION`/`WITHOUT VALIDATION` to an `ALTER
    /// TABLE` that modifies a virtual generated column. `None` omits the
    /// clause.
    pub virtual_col_validation: Option<bool>,
}

impl Default for StatementModifiers {
    fn default() -> Self {
        Self {
            allow_unsafe: false,
            next_auto_increment: NextAutoIncrementMode::default(),
            lax_column_order: false,
            lax_comments: false,
            partitioning: PartitioningModifier::default(),
            strict_index_order: true,
            strict_foreign_key_naming: true,
            algorithm: None,
            lock_level: None,
            virtual_col_validation: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedStatement {
    pub sql: String,
    pub is_unsafe: bool,
    /// `true` when the clause was unsafe and `allow_unsafe` was off: the
    /// statement text is still produced, but commented out, so a diff
    /// output shows what was skipped rather than silently dropping it.
    pub suppressed: bool,
}

fn index_part_sql(part: &IndexPart) -> String {
    let mut clause = if let Some(expression) = &part.expression {
        format!("({expression})")
    } else {
        escape_identifier(&part.column)
    };
    if let Some(len) = part.prefix_length {
        clause.push_str(&format!("({len})"));
    }
    if part.descending {
        clause.push_str(" DESC");
    }
    clause
}

fn index_definition_sql(index: &Index) -> String {
    let columns = index.parts.iter().map(index_part_sql).collect::<Vec<_>>().join(",");
    if index.primary {
        return format!("PRIMARY KEY ({columns})");
    }
    let mut clause = match index.index_type {
        IndexType::FullText => format!("FULLTEXT KEY {} ({columns})", escape_identifier(&index.name)),
        IndexType::Spatial => format!("SPATIAL KEY {} ({columns})", escape_identifier(&index.name)),
        IndexType::Btree | IndexType::Hash => {
            let keyword = if index.unique { "UNIQUE KEY" } else { "KEY" };
            format!("{keyword} {} ({columns})", escape_identifier(&index.name))
        }
    };
    if let Some(parser) = &index.fulltext_parser {
        clause.push_str(&format!(" WITH PARSER {}", escape_identifier(parser)));
    }
    clause
}

fn foreign_key_definition_sql(fk: &ForeignKey) -> String {
    let columns = fk.columns.iter().map(|c| escape_identifier(c)).collect::<Vec<_>>().join(",");
    let referenced = fk
        .referenced_columns
        .iter()
        .map(|c| escape_identifier(c))
        .collect::<Vec<_>>()
        .join(",");
    let mut clause = format!(
        "CONSTRAINT {} FOREIGN KEY ({columns}) REFERENCES {} ({referenced})",
        escape_identifier(&fk.name),
        escape_identifier(&fk.referenced_table)
    );
    if fk.on_delete != crate::schema::ReferentialAction::Restrict {
        clause.push_str(&format!(" ON DELETE {}", fk.on_delete.as_sql()));
    }
    if fk.on_update != crate::schema::ReferentialAction::Restrict {
        clause.push_str(&format!(" ON UPDATE {}", fk.on_update.as_sql()));
    }
    clause
}

fn is_partitioning_clause(clause: &AlterClause) -> bool {
    matches!(
        clause,
        AlterClause::RemovePartitioning
            | AlterClause::AddPartitioning { .. }
            | AlterClause::ModifyPartitioning { .. }
            | AlterClause::AddPartitionList { .. }
            | AlterClause::DropPartitionList { .. }
    )
}

fn partitioning_clause_allowed(clause: &AlterClause, modifiers: &StatementModifiers) -> bool {
    match modifiers.partitioning {
        PartitioningModifier::Modify => true,
        PartitioningModifier::Keep => false,
        PartitioningModifier::RemoveOnly => {
            matches!(clause, AlterClause::RemovePartitioning | AlterClause::DropPartitionList { .. })
        }
    }
}

/// Indices of `DropForeignKey`/`AddForeignKey` clauses that represent a pure
/// rename (every field but the name matches) and can be suppressed under
/// `strict_foreign_key_naming == false`.
///
/// The differ never actually emits such a pair today: `diff_tables` treats
/// any foreign key whose name changed as an independent drop plus add, and
/// a `DropForeignKey` only carries the old name, not its full definition, so
/// there's nothing here to compare against. This stays in place as the hook
/// `strict_foreign_key_naming` needs once the differ starts attaching the
/// old definition to its drop clauses.
fn fk_rename_pairs(clauses: &[AlterClause]) -> Vec<(usize, usize)> {
    let _ = clauses;
    Vec::new()
}

/// Renders one clause's SQL fragment, or `None` when `modifiers` says to
/// drop it entirely.
fn render_clause(clause: &AlterClause, modifiers: &StatementModifiers) -> Option<String> {
    if is_partitioning_clause(clause) && !partitioning_clause_allowed(clause, modifiers) {
        return None;
    }
    Some(match clause {
        AlterClause::AddColumn { definition, after, .. } => {
            let mut sql = format!("ADD COLUMN {definition}");
            append_after(&mut sql, after);
            sql
        }
        AlterClause::DropColumn { name } => format!("DROP COLUMN {}", escape_identifier(name)),
        AlterClause::ModifyColumn { definition, after, positional_only, .. } => {
            if *positional_only && modifiers.lax_column_order {
                return None;
            }
            let mut sql = format!("MODIFY COLUMN {definition}");
            append_after(&mut sql, after);
            sql
        }
        AlterClause::AddIndex { index } => format!("ADD {}", index_definition_sql(index)),
        AlterClause::DropIndex { name } => format!("DROP INDEX {}", escape_identifier(name)),
        AlterClause::AddPrimaryKey { index } => format!("ADD {}", index_definition_sql(index)),
        AlterClause::DropPrimaryKey => "DROP PRIMARY KEY".to_string(),
        AlterClause::AddForeignKey { foreign_key } => format!("ADD {}", foreign_key_definition_sql(foreign_key)),
        AlterClause::DropForeignKey { name } => format!("DROP FOREIGN KEY {}", escape_identifier(name)),
        AlterClause::ChangeEngine { to } => format!("ENGINE={to}"),
        AlterClause::ChangeAutoIncrement { to } => {
            if matches!(modifiers.next_auto_increment, NextAutoIncrementMode::Never) {
                return None;
            }
            format!("AUTO_INCREMENT={to}")
        }
        AlterClause::ChangeComment { to } => format!("COMMENT={}", crate::quoting::quote_literal(to)),
        AlterClause::ChangeCharsetCollation { charset, collation } => {
            format!("DEFAULT CHARSET={charset} COLLATE={collation}")
        }
        AlterClause::ChangeRowFormat { to } => format!("ROW_FORMAT={}", to.to_ascii_uppercase()),
        AlterClause::RemovePartitioning => "REMOVE PARTITIONING".to_string(),
        AlterClause::AddPartitioning { partitioning } => {
            format!("ADD {}", crate::generator::partition_clause(partitioning))
        }
        AlterClause::ModifyPartitioning { partitioning } => crate::generator::partition_clause(partitioning),
        AlterClause::AddPartitionList { partitions } => {
            let body = partitions
                .iter()
                .map(|p| format!("PARTITION {} VALUES {}", escape_identifier(&p.name), p.value))
                .collect::<Vec<_>>()
                .join(", ");
            format!("ADD PARTITION ({body})")
        }
        AlterClause::DropPartitionList { names } => {
            format!("DROP PARTITION {}", names.iter().map(|n| escape_identifier(n)).collect::<Vec<_>>().join(","))
        }
    })
}

fn append_after(sql: &mut String, after: &Option<String>) {
    match after {
        Some(name) => sql.push_str(&format!(" AFTER {}", escape_identifier(name))),
        None => sql.push_str(" FIRST"),
    }
}

fn append_statement_suffix(sql: &mut String, clauses: &[AlterClause], modifiers: &StatementModifiers) {
    if let Some(algorithm) = &modifiers.algorithm {
        sql.push_str(&format!(", ALGORITHM={algorithm}"));
    }
    if let Some(lock_level) = &modifiers.lock_level {
        sql.push_str(&format!(", LOCK={lock_level}"));
    }
    if let Some(with_validation) = modifiers.virtual_col_validation {
        if clauses.iter().any(|c| matches!(c, AlterClause::ModifyColumn { .. })) {
            sql.push_str(if with_validation { ", WITH VALIDATION" } else { ", WITHOUT VALIDATION" });
        }
    }
}

fn render_alter_table(name: &str, clauses: &[AlterClause], modifiers: &StatementModifiers) -> Vec<RenderedStatement> {
    let suppressed_fk_renames: Vec<usize> =
        if modifiers.strict_foreign_key_naming { vec![] } else { fk_rename_pairs(clauses).into_iter().flat_map(|(a, b)| [a, b]).collect() };

    let has_other_substantive_clause = clauses.iter().any(|c| !matches!(c, AlterClause::ChangeComment { .. }));
    let comment_suppressible = modifiers.lax_comments && has_other_substantive_clause;

    let mut safe_fragments = Vec::new();
    let mut suppressed = Vec::new();

    for (idx, clause) in clauses.iter().enumerate() {
        if suppressed_fk_renames.contains(&idx) {
            continue;
        }
        if comment_suppressible && matches!(clause, AlterClause::ChangeComment { .. }) {
            continue;
        }
        let Some(sql) = render_clause(clause, modifiers) else {
            continue;
        };
        if clause.is_unsafe() && !modifiers.allow_unsafe {
            log::warn!("suppressing unsafe clause on `{name}`: {}", clause.label());
            suppressed.push(sql);
        } else {
            safe_fragments.push(sql);
        }
    }

    let mut statements = Vec::new();
    if !safe_fragments.is_empty() {
        let mut sql = format!("ALTER TABLE {} {}", escape_identifier(name), safe_fragments.join(", "));
        append_statement_suffix(&mut sql, clauses, modifiers);
        sql.push(';');
        statements.push(RenderedStatement { sql, is_unsafe: false, suppressed: false });
    }
    if !suppressed.is_empty() {
        statements.push(RenderedStatement {
            sql: format!(
                "-- ALTER TABLE {} {}; -- suppressed: unsafe, rerun with allow_unsafe",
                escape_identifier(name),
                suppressed.join(", ")
            ),
            is_unsafe: true,
            suppressed: true,
        });
    }
    statements
}

#[must_use]
pub fn format_diff(diff: &SchemaDiff, flavor: Flavor, modifiers: &StatementModifiers) -> Vec<RenderedStatement> {
    let mut statements = Vec::new();
    for object_diff in &diff.object_diffs {
        match object_diff {
            ObjectDiff::CreateTable(table) => statements.push(RenderedStatement {
                sql: format!("{};", generate_create_table(table, flavor)),
                is_unsafe: false,
                suppressed: false,
            }),
            ObjectDiff::DropTable(name) => {
                let sql = format!("DROP TABLE {};", escape_identifier(name));
                if modifiers.allow_unsafe {
                    statements.push(RenderedStatement { sql, is_unsafe: true, suppressed: false });
                } else {
                    log::warn!("suppressing DROP TABLE `{name}`: unsafe");
                    statements.push(RenderedStatement {
                        sql: format!("-- {sql} -- suppressed: unsafe, rerun with allow_unsafe"),
                        is_unsafe: true,
                        suppressed: true,
                    });
                }
            }
            ObjectDiff::AlterTable { name, clauses, supported: false } => {
                statements.push(RenderedStatement {
                    sql: format!("-- ALTER TABLE {} skipped: unsupported for diffing", escape_identifier(name)),
                    is_unsafe: false,
                    suppressed: true,
                });
                debug_assert!(clauses.is_empty());
            }
            ObjectDiff::AlterTable { name, clauses, supported: true } => {
                statements.extend(render_alter_table(name, clauses, modifiers));
            }
            ObjectDiff::CreateRoutine(routine) | ObjectDiff::AlterRoutine(routine) => statements.push(RenderedStatement {
                sql: routine.definition.clone(),
                is_unsafe: false,
                suppressed: false,
            }),
            ObjectDiff::DropRoutine { name, kind } => {
                let keyword = match kind {
                    crate::schema::RoutineKind::Procedure => "PROCEDURE",
                    crate::schema::RoutineKind::Function => "FUNCTION",
                };
                statements.push(RenderedStatement {
                    sql: format!("DROP {keyword} {};", escape_identifier(name)),
                    is_unsafe: false,
                    suppressed: false,
                });
            }
            ObjectDiff::AlterSchema { new_charset, new_collation } => {
                let mut sql = format!("ALTER DATABASE {}", escape_identifier(&diff.schema_name));
                if let Some(charset) = new_charset {
                    sql.push_str(&format!(" CHARACTER SET {charset}"));
                }
                if let Some(collation) = new_collation {
                    sql.push_str(&format!(" COLLATE {collation}"));
                }
                sql.push(';');
                statements.push(RenderedStatement { sql, is_unsafe: false, suppressed: false });
            }
        }
    }
    statements
}
