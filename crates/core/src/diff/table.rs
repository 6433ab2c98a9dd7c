//! C7: the single-table differ. Compares an old and new [`Table`] and
//! produces the ordered [`AlterClause`] sequence that would turn one into
//! the other.

use std::collections::BTreeSet;

use crate::diff::clause::AlterClause;
use crate::diff::ordering::columns_needing_after_clause;
use crate::flavor::Flavor;
use crate::schema::{Column, GeneratedExpr, PartitionDef, Partitioning, Table};
use crate::types::{charset_change_is_unsafe, modify_column_type_is_unsafe};

/// Renders the column-definition fragment (type + nullability + default +
/// ...) the way [`crate::generator`] would for a `MODIFY`/`ADD COLUMN`
/// clause, reusing its column-clause rendering.
fn column_definition(column: &Column, flavor: Flavor) -> String {
    crate::generator::render_column_definition(column, flavor)
}

fn column_is_unsafe_to_modify(old: &Column, new: &Column) -> bool {
    if modify_column_type_is_unsafe(&old.column_type, &new.column_type) {
        return true;
    }
    let is_text = old.charset.is_some() || new.charset.is_some();
    if charset_change_is_unsafe(old.charset.as_deref(), new.charset.as_deref(), is_text) {
        return true;
    }
    // Rule 9: a stored generated column that changes its generation
    // expression is unsafe (existing stored values don't get recomputed by
    // a plain `MODIFY COLUMN`); a virtual generated column recomputes on
    // every read, so changing its expression is safe.
    match (&old.generated, &new.generated) {
        (Some(GeneratedExpr { expression: old_expr, stored: true }), Some(GeneratedExpr { expression: new_expr, .. }))
            if old_expr != new_expr =>
        {
            true
        }
        (Some(old_gen), None) | (None, Some(old_gen)) => old_gen.stored,
        _ => false,
    }
}

fn column_clauses(old: &Table, new: &Table, flavor: Flavor) -> Vec<AlterClause> {
    let mut clauses = Vec::new();
    let old_by_name = old.columns_by_name();
    let new_by_name = new.columns_by_name();

    for column in &old.columns {
        if !new_by_name.contains_key(column.name.as_str()) {
            clauses.push(AlterClause::DropColumn { name: column.name.clone() });
        }
    }

    let old_order: Vec<&str> = old.column_order();
    let new_order: Vec<&str> = new.column_order();
    let moves = columns_needing_after_clause(&old_order, &new_order);
    let after_by_name: std::collections::HashMap<&str, Option<String>> = moves
        .iter()
        .map(|(name, after)| (name.as_str(), after.clone()))
        .collect();

    for name in &new_order {
        let new_column = new_by_name[name];
        match old_by_name.get(name) {
            None => {
                clauses.push(AlterClause::AddColumn {
                    name: (*name).to_string(),
                    definition: column_definition(new_column, flavor),
                    after: after_by_name.get(name).cloned().flatten(),
                });
            }
            Some(old_column) => {
                let moved = after_by_name.contains_key(name);
                let definition_changed = *old_column != new_column;
                if definition_changed || moved {
                    clauses.push(AlterClause::ModifyColumn {
                        name: (*name).to_string(),
                        definition: column_definition(new_column, flavor),
                        after: after_by_name.get(name).cloned().flatten(),
                        is_unsafe: column_is_unsafe_to_modify(*old_column, new_column),
                        positional_only: moved && !definition_changed,
                    });
                }
            }
        }
    }

    clauses
}

fn primary_key_clauses(old: &Table, new: &Table) -> Vec<AlterClause> {
    let mut clauses = Vec::new();
    match (&old.primary_key, &new.primary_key) {
        (None, Some(new_pk)) => clauses.push(AlterClause::AddPrimaryKey { index: new_pk.clone() }),
        (Some(_), None) => clauses.push(AlterClause::DropPrimaryKey),
        (Some(old_pk), Some(new_pk)) if old_pk != new_pk => {
            clauses.push(AlterClause::DropPrimaryKey);
            clauses.push(AlterClause::AddPrimaryKey { index: new_pk.clone() });
        }
        _ => {}
    }
    clauses
}

fn index_clauses(old: &Table, new: &Table) -> Vec<AlterClause> {
    let mut clauses = Vec::new();
    for index in &old.secondary_indexes {
        match new.index(&index.name) {
            Some(new_index) if new_index == index => {}
            Some(new_index) => {
                clauses.push(AlterClause::DropIndex { name: index.name.clone() });
                clauses.push(AlterClause::AddIndex { index: new_index.clone() });
            }
            None => clauses.push(AlterClause::DropIndex { name: index.name.clone() }),
        }
    }
    for index in &new.secondary_indexes {
        if old.index(&index.name).is_none() {
            clauses.push(AlterClause::AddIndex { index: index.clone() });
        }
    }
    clauses
}

/// Foreign keys are always dropped before any column/index changes and
/// added back after: a `MODIFY COLUMN` on a column that still carries an
/// old foreign key can fail even when the new column type is compatible
/// with the constraint, and an `ADD`ed foreign key needs the final column
/// shape to already be in place to validate. The schema-level differ lifts
/// the `adds` half of this out into a schema-global final phase so a
/// forward reference to a table created in the same diff still resolves.
fn foreign_key_clauses(old: &Table, new: &Table) -> (Vec<AlterClause>, Vec<AlterClause>) {
    let mut drops = Vec::new();
    let mut adds = Vec::new();
    let old_by_name = old.foreign_keys_by_name();
    let new_by_name = new.foreign_keys_by_name();

    for fk in &old.foreign_keys {
        match new_by_name.get(fk.name.as_str()) {
            Some(new_fk) if *new_fk == fk => {}
            Some(new_fk) => {
                drops.push(AlterClause::DropForeignKey { name: fk.name.clone() });
                adds.push(AlterClause::AddForeignKey { foreign_key: (*new_fk).clone() });
            }
            None => drops.push(AlterClause::DropForeignKey { name: fk.name.clone() }),
        }
    }
    for fk in &new.foreign_keys {
        if !old_by_name.contains_key(fk.name.as_str()) {
            adds.push(AlterClause::AddForeignKey { foreign_key: fk.clone() });
        }
    }
    (drops, adds)
}

fn table_option_clauses(old: &Table, new: &Table) -> Vec<AlterClause> {
    let mut clauses = Vec::new();
    if old.engine != new.engine {
        clauses.push(AlterClause::ChangeEngine { to: new.engine.clone() });
    }
    if old.charset != new.charset || old.collation != new.collation {
        clauses.push(AlterClause::ChangeCharsetCollation {
            charset: new.charset.clone(),
            collation: new.collation.clone(),
        });
    }
    if let (Some(old_ai), Some(new_ai)) = (old.auto_increment, new.auto_increment) {
        if new_ai > old_ai {
            clauses.push(AlterClause::ChangeAutoIncrement { to: new_ai });
        }
    }
    if old.comment != new.comment {
        clauses.push(AlterClause::ChangeComment { to: new.comment.clone() });
    }
    if old.row_format != new.row_format {
        if let Some(to) = &new.row_format {
            clauses.push(AlterClause::ChangeRowFormat { to: to.clone() });
        }
    }
    clauses
}

/// Compares two same-scheme (same method/expression) partition lists by
/// name: a pure add/drop of named partitions becomes `AddPartitionList`/
/// `DropPartitionList`; anything else (a partition redefined in place, or
/// the sub-partitioning/algorithm changing) falls back to rebuilding the
/// whole clause via `ModifyPartitioning`.
fn partition_list_clauses(old_partitions: &[PartitionDef], new: &Partitioning) -> Vec<AlterClause> {
    let old_names: BTreeSet<&str> = old_partitions.iter().map(|p| p.name.as_str()).collect();
    let new_names: BTreeSet<&str> = new.partitions.iter().map(|p| p.name.as_str()).collect();

    let dropped: Vec<String> = old_names.difference(&new_names).map(|s| (*s).to_string()).collect();
    let added: Vec<PartitionDef> = new.partitions.iter().filter(|p| !old_names.contains(p.name.as_str())).cloned().collect();

    let kept_unchanged = old_partitions
        .iter()
        .filter(|p| new_names.contains(p.name.as_str()))
        .all(|old_def| new.partitions.iter().any(|new_def| new_def == old_def));

    if !kept_unchanged {
        return vec![AlterClause::ModifyPartitioning { partitioning: new.clone() }];
    }

    let mut clauses = Vec::new();
    if !dropped.is_empty() {
        clauses.push(AlterClause::DropPartitionList { names: dropped });
    }
    if !added.is_empty() {
        clauses.push(AlterClause::AddPartitionList { partitions: added });
    }
    clauses
}

fn partitioning_clauses(old: &Table, new: &Table) -> Vec<AlterClause> {
    match (&old.partitioning, &new.partitioning) {
        (None, None) => vec![],
        (Some(_), None) => vec![AlterClause::RemovePartitioning],
        (None, Some(new_p)) => vec![AlterClause::AddPartitioning { partitioning: new_p.clone() }],
        (Some(old_p), Some(new_p)) if old_p == new_p => vec![],
        (Some(old_p), Some(new_p)) => {
            let same_scheme = old_p.method == new_p.method
                && old_p.expression == new_p.expression
                && old_p.sub_method == new_p.sub_method
                && old_p.sub_expression == new_p.sub_expression
                && old_p.algorithm == new_p.algorithm;
            if same_scheme {
                partition_list_clauses(&old_p.partitions, new_p)
            } else {
                vec![AlterClause::ModifyPartitioning { partitioning: new_p.clone() }]
            }
        }
    }
}

/// Produces the full ordered clause sequence for `ALTER TABLE old -> new`.
/// Order: drop foreign keys, drop/modify/add columns, primary key changes,
/// secondary index changes, partitioning changes, re-add foreign keys,
/// table option changes — auto-increment last, since it only makes sense
/// once the final column shape (including any new auto-increment column)
/// is in place.
///
/// If either side is flagged `unsupported_for_diff`, no clauses are
/// produced at all: the introspector has already determined this table
/// can't be round-tripped reliably, so generating live ALTERs against it
/// would be guessing. The schema-level differ surfaces that as an
/// unsupported `AlterTable` instead.
#[must_use]
pub fn diff_tables(old: &Table, new: &Table, flavor: Flavor) -> Vec<AlterClause> {
    if old.unsupported_for_diff.is_some() || new.unsupported_for_diff.is_some() {
        return vec![];
    }

    let (fk_drops, fk_adds) = foreign_key_clauses(old, new);

    let mut clauses = Vec::new();
    clauses.extend(fk_drops);
    clauses.extend(column_clauses(old, new, flavor));
    clauses.extend(primary_key_clauses(old, new));
    clauses.extend(index_clauses(old, new));
    clauses.extend(partitioning_clauses(old, new));
    clauses.extend(fk_adds);
    clauses.extend(table_option_clauses(old, new));
    clauses
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flavor::Vendor;
    use crate::schema::{ColumnDefault, PartitionMethod, PartitionRenderMode};

    fn flavor() -> Flavor {
        Flavor::new(Vendor::MySql, 8, 0, 34)
    }

    fn base_column(name: &str, column_type: &str) -> Column {
        Column {
            name: name.to_string(),
            column_type: column_type.to_string(),
            nullable: true,
            default: ColumnDefault::Null,
            auto_increment: false,
            on_update_current_timestamp: false,
            charset: None,
            collation: None,
            comment: String::new(),
            generated: None,
            compressed: false,
            invisible: false,
        }
    }

    fn table_with_columns(columns: Vec<Column>) -> Table {
        Table {
            name: "t".to_string(),
            engine: "InnoDB".to_string(),
            row_format: None,
            charset: "utf8mb4".to_string(),
            collation: "utf8mb4_0900_ai_ci".to_string(),
            comment: String::new(),
            create_options: String::new(),
            auto_increment: None,
            columns,
            primary_key: None,
            secondary_indexes: vec![],
            foreign_keys: vec![],
            partitioning: None,
            unsupported_for_diff: None,
        }
    }

    #[test]
    fn add_column_diff() {
        let old = table_with_columns(vec![base_column("id", "int")]);
        let new = table_with_columns(vec![base_column("id", "int"), base_column("email", "varchar(255)")]);
        let clauses = diff_tables(&old, &new, flavor());
        assert!(matches!(
            clauses.as_slice(),
            [AlterClause::AddColumn { name, .. }] if name == "email"
        ));
    }

    #[test]
    fn narrowing_modify_is_flagged_unsafe() {
        let old = table_with_columns(vec![base_column("qty", "int")]);
        let new = table_with_columns(vec![base_column("qty", "smallint")]);
        let clauses = diff_tables(&old, &new, flavor());
        assert_eq!(clauses.len(), 1);
        assert!(clauses[0].is_unsafe());
    }

    #[test]
    fn foreign_key_change_splits_into_drop_then_add() {
        use crate::schema::{ForeignKey, ReferentialAction};
        let fk = ForeignKey {
            name: "fk_owner".to_string(),
            columns: vec!["owner_id".to_string()],
            referenced_schema: "s".to_string(),
            referenced_table: "users".to_string(),
            referenced_columns: vec!["id".to_string()],
            on_delete: ReferentialAction::Restrict,
            on_update: ReferentialAction::Restrict,
        };
        let mut new_fk = fk.clone();
        new_fk.on_delete = ReferentialAction::Cascade;

        let mut old = table_with_columns(vec![base_column("owner_id", "int")]);
        old.foreign_keys.push(fk);
        let mut new = table_with_columns(vec![base_column("owner_id", "int")]);
        new.foreign_keys.push(new_fk);

        let clauses = diff_tables(&old, &new, flavor());
        let drop_pos = clauses.iter().position(|c| matches!(c, AlterClause::DropForeignKey { .. }));
        let add_pos = clauses.iter().position(|c| matches!(c, AlterClause::AddForeignKey { .. }));
        assert!(drop_pos.is_some() && add_pos.is_some());
        assert!(drop_pos < add_pos);
    }

    #[test]
    fn unsupported_table_produces_no_clauses() {
        let old = table_with_columns(vec![base_column("qty", "int")]);
        let mut new = table_with_columns(vec![base_column("qty", "bigint")]);
        new.unsupported_for_diff = Some("test".to_string());
        assert!(diff_tables(&old, &new, flavor()).is_empty());
    }

    fn partitioning(partitions: Vec<PartitionDef>) -> Partitioning {
        Partitioning {
            method: PartitionMethod::Range,
            sub_method: None,
            expression: "id".to_string(),
            sub_expression: None,
            partitions,
            render_mode: PartitionRenderMode::Default,
            algorithm: None,
        }
    }

    fn partition_def(name: &str, value: &str) -> PartitionDef {
        PartitionDef { name: name.to_string(), sub_name: None, value: value.to_string(), data_directory: None, comment: String::new() }
    }

    #[test]
    fn adding_partitioning_emits_add_partitioning() {
        let old = table_with_columns(vec![base_column("id", "int")]);
        let mut new = table_with_columns(vec![base_column("id", "int")]);
        new.partitioning = Some(partitioning(vec![partition_def("p0", "LESS THAN (100)")]));
        let clauses = diff_tables(&old, &new, flavor());
        assert!(matches!(clauses.as_slice(), [AlterClause::AddPartitioning { .. }]));
    }

    #[test]
    fn dropping_one_partition_emits_drop_partition_list() {
        let mut old = table_with_columns(vec![base_column("id", "int")]);
        old.partitioning = Some(partitioning(vec![partition_def("p0", "LESS THAN (100)"), partition_def("p1", "LESS THAN (200)")]));
        let mut new = table_with_columns(vec![base_column("id", "int")]);
        new.partitioning = Some(partitioning(vec![partition_def("p0", "LESS THAN (100)")]));
        let clauses = diff_tables(&old, &new, flavor());
        assert!(matches!(clauses.as_slice(), [AlterClause::DropPartitionList { names }] if names == &["p1".to_string()]));
        assert!(clauses[0].is_unsafe());
    }

    #[test]
    fn removing_partitioning_entirely() {
        let mut old = table_with_columns(vec![base_column("id", "int")]);
        old.partitioning = Some(partitioning(vec![partition_def("p0", "LESS THAN (100)")]));
        let new = table_with_columns(vec![base_column("id", "int")]);
        let clauses = diff_tables(&old, &new, flavor());
        assert_eq!(clauses, vec![AlterClause::RemovePartitioning]);
    }
}
