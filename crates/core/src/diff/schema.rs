//! C8: composes per-table/per-routine diffs into one [`SchemaDiff`] across
//! an entire schema.

use crate::diff::clause::AlterClause;
use crate::diff::table::diff_tables;
use crate::flavor::Flavor;
use crate::schema::{Routine, RoutineKind, Schema, Table};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectDiff {
    CreateTable(Table),
    DropTable(String),
    AlterTable {
        name: String,
        clauses: Vec<AlterClause>,
        /// `false` when either side of the underlying table is flagged
        /// `unsupported_for_diff`: `clauses` is always empty in that case,
        /// and this flags the enclosing alter for the caller instead of
        /// silently doing nothing.
        supported: bool,
    },
    CreateRoutine(Routine),
    DropRoutine {
        name: String,
        kind: RoutineKind,
    },
    AlterRoutine(Routine),
    /// Schema-level default charset/collation change. Either field is
    /// `None` when that particular attribute didn't change.
    AlterSchema {
        new_charset: Option<String>,
        new_collation: Option<String>,
    },
}

impl ObjectDiff {
    #[must_use]
    pub fn is_unsafe(&self) -> bool {
        match self {
            Self::DropTable(_) | Self::DropRoutine { .. } => true,
            Self::AlterTable { clauses, .. } => clauses.iter().any(AlterClause::is_unsafe),
            Self::CreateTable(_) | Self::CreateRoutine(_) | Self::AlterRoutine(_) | Self::AlterSchema { .. } => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDiff {
    pub schema_name: String,
    pub object_diffs: Vec<ObjectDiff>,
}

impl SchemaDiff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.object_diffs.is_empty()
    }

    #[must_use]
    pub fn has_unsafe_changes(&self) -> bool {
        self.object_diffs.iter().any(ObjectDiff::is_unsafe)
    }
}

/// Computes the ordered set of changes that turn `old` into `new`.
///
/// Output order: schema-level attribute changes first,
/// then every `DROP`, then every `ALTER`, then every `CREATE`; foreign-key
/// additions are pulled out of each table's own `AlterTable` and appended
/// in one final schema-global phase, so a `FOREIGN KEY` referencing a
/// table created earlier in this same diff never appears before that
/// table's `CREATE TABLE`.
#[must_use]
pub fn diff_schemas(old: &Schema, new: &Schema, flavor: Flavor) -> SchemaDiff {
    let mut object_diffs = Vec::new();

    let new_charset = (old.default_charset != new.default_charset).then(|| new.default_charset.clone());
    let new_collation = (old.default_collation != new.default_collation).then(|| new.default_collation.clone());
    if new_charset.is_some() || new_collation.is_some() {
        object_diffs.push(ObjectDiff::AlterSchema { new_charset, new_collation });
    }

    for old_table in &old.tables {
        if new.table(&old_table.name).is_none() {
            object_diffs.push(ObjectDiff::DropTable(old_table.name.clone()));
        }
    }
    for old_routine in &old.routines {
        if new.routine(&old_routine.name, old_routine.kind).is_none() {
            object_diffs.push(ObjectDiff::DropRoutine {
                name: old_routine.name.clone(),
                kind: old_routine.kind,
            });
        }
    }

    let mut deferred_fk_adds: Vec<(String, Vec<AlterClause>)> = Vec::new();
    for new_table in &new.tables {
        let Some(old_table) = old.table(&new_table.name) else { continue };
        if old_table.unsupported_for_diff.is_some() || new_table.unsupported_for_diff.is_some() {
            object_diffs.push(ObjectDiff::AlterTable { name: new_table.name.clone(), clauses: vec![], supported: false });
            continue;
        }
        let mut clauses = diff_tables(old_table, new_table, flavor);
        let fk_adds: Vec<AlterClause> =
            clauses.iter().filter(|c| matches!(c, AlterClause::AddForeignKey { .. })).cloned().collect();
        clauses.retain(|c| !matches!(c, AlterClause::AddForeignKey { .. }));
        if !fk_adds.is_empty() {
            deferred_fk_adds.push((new_table.name.clone(), fk_adds));
        }
        if !clauses.is_empty() {
            object_diffs.push(ObjectDiff::AlterTable { name: new_table.name.clone(), clauses, supported: true });
        }
    }
    for new_routine in &new.routines {
        if let Some(old_routine) = old.routine(&new_routine.name, new_routine.kind) {
            if old_routine.definition != new_routine.definition {
                object_diffs.push(ObjectDiff::AlterRoutine(new_routine.clone()));
            }
        }
    }

    for new_table in &new.tables {
        if old.table(&new_table.name).is_none() {
            object_diffs.push(ObjectDiff::CreateTable(new_table.clone()));
        }
    }
    for new_routine in &new.routines {
        if old.routine(&new_routine.name, new_routine.kind).is_none() {
            object_diffs.push(ObjectDiff::CreateRoutine(new_routine.clone()));
        }
    }

    for (name, clauses) in deferred_fk_adds {
        object_diffs.push(ObjectDiff::AlterTable { name, clauses, supported: true });
    }

    SchemaDiff {
        schema_name: new.name.clone(),
        object_diffs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flavor::Vendor;
    use crate::schema::{ForeignKey, ReferentialAction};

    fn flavor() -> Flavor {
        Flavor::new(Vendor::MySql, 8, 0, 34)
    }

    fn empty_schema(name: &str, tables: Vec<Table>) -> Schema {
        Schema {
            name: name.to_string(),
            default_charset: "utf8mb4".to_string(),
            default_collation: "utf8mb4_0900_ai_ci".to_string(),
            tables,
            routines: vec![],
        }
    }

    fn minimal_table(name: &str) -> Table {
        Table {
            name: name.to_string(),
            engine: "InnoDB".to_string(),
            row_format: None,
            charset: "utf8mb4".to_string(),
            collation: "utf8mb4_0900_ai_ci".to_string(),
            comment: String::new(),
            create_options: String::new(),
            auto_increment: None,
            columns: vec![],
            primary_key: None,
            secondary_indexes: vec![],
            foreign_keys: vec![],
            partitioning: None,
            unsupported_for_diff: None,
        }
    }

    #[test]
    fn new_table_is_a_create() {
        let old = empty_schema("app", vec![]);
        let new = empty_schema("app", vec![minimal_table("widgets")]);
        let diff = diff_schemas(&old, &new, flavor());
        assert_eq!(diff.object_diffs, vec![ObjectDiff::CreateTable(minimal_table("widgets"))]);
    }

    #[test]
    fn removed_table_is_unsafe_drop() {
        let old = empty_schema("app", vec![minimal_table("widgets")]);
        let new = empty_schema("app", vec![]);
        let diff = diff_schemas(&old, &new, flavor());
        assert!(diff.has_unsafe_changes());
    }

    #[test]
    fn identical_schemas_produce_no_diff() {
        let schema = empty_schema("app", vec![minimal_table("widgets")]);
        let diff = diff_schemas(&schema, &schema, flavor());
        assert!(diff.is_empty());
    }

    #[test]
    fn schema_charset_change_is_surfaced() {
        let old = empty_schema("app", vec![]);
        let mut new = empty_schema("app", vec![]);
        new.default_charset = "latin1".to_string();
        let diff = diff_schemas(&old, &new, flavor());
        assert_eq!(
            diff.object_diffs,
            vec![ObjectDiff::AlterSchema { new_charset: Some("latin1".to_string()), new_collation: None }]
        );
    }

    #[test]
    fn foreign_key_add_is_deferred_past_the_referenced_tables_create() {
        let old = empty_schema("app", vec![minimal_table("orders")]);
        let mut new_orders = minimal_table("orders");
        new_orders.foreign_keys.push(ForeignKey {
            name: "fk_customer".to_string(),
            columns: vec!["customer_id".to_string()],
            referenced_schema: "app".to_string(),
            referenced_table: "customers".to_string(),
            referenced_columns: vec!["id".to_string()],
            on_delete: ReferentialAction::Restrict,
            on_update: ReferentialAction::Restrict,
        });
        let new = empty_schema("app", vec![new_orders, minimal_table("customers")]);

        let diff = diff_schemas(&old, &new, flavor());
        let create_pos = diff
            .object_diffs
            .iter()
            .position(|d| matches!(d, ObjectDiff::CreateTable(t) if t.name == "customers"))
            .expect("customers table created");
        let fk_add_pos = diff
            .object_diffs
            .iter()
            .position(|d| matches!(d, ObjectDiff::AlterTable { clauses, .. } if clauses.iter().any(|c| matches!(c, AlterClause::AddForeignKey { .. }))))
            .expect("fk add present");
        assert!(create_pos < fk_add_pos);
    }

    #[test]
    fn unsupported_table_is_flagged_with_empty_clauses() {
        let mut old_table = minimal_table("legacy");
        old_table.unsupported_for_diff = Some("weird engine".to_string());
        let mut new_table = minimal_table("legacy");
        new_table.unsupported_for_diff = Some("weird engine".to_string());
        new_table.comment = "changed".to_string();

        let old = empty_schema("app", vec![old_table]);
        let new = empty_schema("app", vec![new_table]);
        let diff = diff_schemas(&old, &new, flavor());
        assert_eq!(
            diff.object_diffs,
            vec![ObjectDiff::AlterTable { name: "legacy".to_string(), clauses: vec![], supported: false }]
        );
    }
}
