//! C5: populates a [`Schema`] from a live connection by combining
//! `information_schema` queries with `SHOW CREATE TABLE`/`SHOW CREATE
//! {PROCEDURE,FUNCTION}`, applying the [`fixups`] needed to reconcile the
//! two sources.

mod fixups;
mod queries;

use std::collections::BTreeMap;

use crate::adapter::{DatabaseAdapter, SqlRow};
use crate::config::DiffConfig;
use crate::error::{Error, IntrospectionError, Result};
use crate::flavor::Flavor;
use crate::schema::{
    Column, ColumnDefault, ForeignKey, GeneratedExpr, Index, IndexPart, IndexType, PartitionDef, PartitionMethod,
    Partitioning, PartitionRenderMode, ReferentialAction, Routine, RoutineKind, Schema, Table,
};

fn introspection_error(schema: &str, table: Option<&str>, message: impl Into<String>) -> Error {
    Error::from(IntrospectionError {
        schema: schema.to_string(),
        table: table.map(ToString::to_string),
        message: message.into(),
    })
}

/// Pulls the full schema named in `adapter.current_schema()`.
pub fn introspect_schema(adapter: &mut dyn DatabaseAdapter, flavor: Flavor) -> Result<Schema> {
    let schema_name = adapter.current_schema().to_string();

    let schema_row = adapter
        .query(&sql_with_literal(queries::SCHEMA_QUERY, &schema_name))?
        .into_iter()
        .next()
        .ok_or_else(|| introspection_error(&schema_name, None, "schema does not exist"))?;

    let table_rows = adapter.query(&sql_with_literal(queries::TABLES_QUERY, &schema_name))?;
    let mut tables = Vec::with_capacity(table_rows.len());
    for row in &table_rows {
        let table_name = row.get_string("table_name");
        tables.push(introspect_table(adapter, &schema_name, &table_name, row, flavor)?);
    }

    let routine_rows = adapter.query(&sql_with_literal(queries::ROUTINES_QUERY, &schema_name))?;
    let routines = routine_rows.iter().map(row_to_routine).collect();

    Ok(Schema {
        name: schema_name,
        default_charset: schema_row.get_string("default_character_set_name"),
        default_collation: schema_row.get_string("default_collation_name"),
        tables,
        routines,
    })
}

/// Introspects several independent connections concurrently, one thread per
/// connection, bounded to `config.concurrent_instances` in flight at once.
/// Each entry in `connect` is called exactly once, on its own worker thread;
/// the result at index `i` corresponds to `connect[i]`.
pub fn introspect_many<F>(connect: Vec<F>, flavor: Flavor, config: &DiffConfig) -> Vec<Result<Schema>>
where
    F: FnOnce() -> Result<Box<dyn DatabaseAdapter>> + Send,
{
    let bound = config.concurrent_instances.max(1);
    let mut results: Vec<Option<Result<Schema>>> = (0..connect.len()).map(|_| None).collect();
    let mut remaining: Vec<(usize, F)> = connect.into_iter().enumerate().collect();

    std::thread::scope(|scope| {
        while !remaining.is_empty() {
            let batch: Vec<(usize, F)> = remaining.drain(..remaining.len().min(bound)).collect();
            let handles: Vec<_> = batch
                .into_iter()
                .map(|(index, connect)| {
                    scope.spawn(move || {
                        let outcome = connect().and_then(|mut adapter| introspect_schema(&mut *adapter, flavor));
                        (index, outcome)
                    })
                })
                .collect();
            for handle in handles {
                let (index, outcome) = handle.join().expect("introspection worker thread panicked");
                results[index] = Some(outcome);
            }
        }
    });

    results.into_iter().map(|r| r.expect("every index was assigned by its worker")).collect()
}

fn sql_with_literal(template: &str, value: &str) -> String {
    // None of these queries are ever built from user-controlled input beyond
    // the already-validated schema/table names the caller passed to connect;
    // `crate::quoting::quote_literal` still applies the same escaping as any
    // other literal the engine emits.
    template.replacen('?', &crate::quoting::quote_literal(value), 1)
}

fn sql_with_literals(template: &str, values: &[&str]) -> String {
    let mut out = template.to_string();
    for value in values {
        out = out.replacen('?', &crate::quoting::quote_literal(value), 1);
    }
    out
}

fn introspect_table(
    adapter: &mut dyn DatabaseAdapter,
    schema_name: &str,
    table_name: &str,
    table_row: &SqlRow,
    flavor: Flavor,
) -> Result<Table> {
    let show_create = adapter
        .query(&queries::show_create_table(schema_name, table_name))?
        .into_iter()
        .next()
        .map(|row| row.get_string("Create Table"))
        .unwrap_or_default();

    let column_rows = adapter.query(&sql_with_literals(queries::COLUMNS_QUERY, &[schema_name, table_name]))?;
    let columns: Vec<Column> = column_rows
        .iter()
        .map(|row| row_to_column(row, &show_create, flavor))
        .collect();
    let has_auto_increment_column = columns.iter().any(|c| c.auto_increment);

    let statistics_rows = adapter.query(&sql_with_literals(queries::STATISTICS_QUERY, &[schema_name, table_name]))?;
    let (primary_key, mut secondary_indexes) = build_indexes(&statistics_rows, &show_create);
    if flavor.has_data_dictionary() && secondary_indexes.len() > 1 {
        fixups::reorder_by_show_create(&mut secondary_indexes, &show_create, |i| i.name.as_str());
    }

    let key_column_rows = adapter.query(&sql_with_literals(
        queries::KEY_COLUMN_USAGE_QUERY,
        &[schema_name, table_name],
    ))?;
    let referential_rows = adapter.query(&sql_with_literals(
        queries::REFERENTIAL_CONSTRAINTS_QUERY,
        &[schema_name, table_name],
    ))?;
    let mut foreign_keys = build_foreign_keys(&key_column_rows, &referential_rows, flavor);
    if !flavor.sorted_foreign_keys() && foreign_keys.len() > 1 {
        fixups::reorder_by_show_create(&mut foreign_keys, &show_create, |fk| fk.name.as_str());
    }

    let partition_rows = adapter.query(&sql_with_literals(queries::PARTITIONS_QUERY, &[schema_name, table_name]))?;
    let partitioning = build_partitioning(&partition_rows, &show_create);

    let auto_increment = fixups::normalize_stale_auto_increment(
        table_row.get_u64("auto_increment"),
        has_auto_increment_column,
    );

    let engine = table_row.get_string("engine");
    let create_options = build_create_options(table_row, &show_create, &engine, flavor);

    let table = Table {
        name: table_name.to_string(),
        engine,
        row_format: table_row.get_opt_string("row_format"),
        charset: table_row.get_string("charset"),
        collation: table_row.get_string("collation"),
        comment: fixups::unescape_show_create_comment(&table_row.get_string("table_comment")),
        create_options,
        auto_increment,
        columns,
        primary_key,
        secondary_indexes,
        foreign_keys,
        partitioning,
        unsupported_for_diff: None,
    };

    let unsupported_for_diff = crate::schema::validate_table(&table, flavor);
    Ok(Table {
        unsupported_for_diff,
        ..table
    })
}

fn build_create_options(table_row: &SqlRow, show_create: &str, engine: &str, flavor: Flavor) -> String {
    let mut raw = table_row.get_string("create_options");
    if flavor.has_data_dictionary() && raw.contains(' ') {
        if let Some(recovered) = fixups::extract_create_options_from_show_create(show_create) {
            raw = recovered;
        }
    }
    let stripped = fixups::strip_noop_innodb_create_options(&raw, engine);
    fixups::strip_page_compressed_if_unsupported(&stripped, flavor)
}

fn row_to_column(row: &SqlRow, show_create: &str, flavor: Flavor) -> Column {
    let name = row.get_string("column_name");
    let column_type = row.get_string("column_type");
    let extra = row.get_string("extra");
    let nullable = row.get_bool("is_nullable");

    let mut default = match row.get_opt_string("column_default") {
        Some(literal) if extra.to_ascii_lowercase().contains("default_generated") => ColumnDefault::Expression(literal),
        Some(literal) if literal.to_ascii_uppercase().starts_with("CURRENT_TIMESTAMP") => {
            let fsp = literal
                .find('(')
                .and_then(|open| literal[open + 1..].find(')').map(|close| &literal[open + 1..open + 1 + close]))
                .and_then(|digits| digits.parse().ok())
                .unwrap_or(0);
            ColumnDefault::CurrentTimestamp { fsp }
        }
        Some(literal) => ColumnDefault::Literal(literal),
        None if nullable && row.get("column_default").is_none_or(|v| v.is_null()) => ColumnDefault::Null,
        None => ColumnDefault::None,
    };
    if matches!(default, ColumnDefault::None) {
        if let Some(recovered) = fixups::recover_blob_default_from_show_create(show_create, &name, flavor) {
            default = ColumnDefault::Expression(recovered);
        }
    }

    let generation_expression = row.get_opt_string("generation_expression").filter(|s| !s.is_empty());
    let generated = generation_expression.map(|expression| {
        let expression = if flavor.has_data_dictionary() {
            fixups::recover_generated_expression_from_show_create(show_create, &name).unwrap_or(expression)
        } else {
            expression
        };
        GeneratedExpr {
            expression,
            stored: extra.to_ascii_lowercase().contains("stored generated"),
        }
    });

    Column {
        name: name.clone(),
        column_type,
        nullable,
        default,
        auto_increment: extra.to_ascii_lowercase().contains("auto_increment"),
        on_update_current_timestamp: extra.to_ascii_lowercase().contains("on update current_timestamp"),
        charset: row.get_opt_string("character_set_name"),
        collation: row.get_opt_string("collation_name"),
        comment: fixups::unescape_show_create_comment(&row.get_string("column_comment")),
        generated,
        compressed: flavor.supports_column_compression() && fixups::column_is_compressed_in_show_create(show_create, &name),
        invisible: extra.to_ascii_lowercase().contains("invisible"),
    }
}

fn index_type_and_unique(first: &SqlRow) -> (IndexType, bool) {
    let unique = !first.get_bool("non_unique");
    let index_type = match first.get_string("index_type").to_ascii_uppercase().as_str() {
        "FULLTEXT" => IndexType::FullText,
        "SPATIAL" | "RTREE" => IndexType::Spatial,
        "HASH" => IndexType::Hash,
        _ => IndexType::Btree,
    };
    (index_type, unique)
}

fn build_indexes(rows: &[SqlRow], show_create: &str) -> (Option<Index>, Vec<Index>) {
    let mut by_name: BTreeMap<String, Vec<&SqlRow>> = BTreeMap::new();
    for row in rows {
        by_name.entry(row.get_string("index_name")).or_default().push(row);
    }

    let mut primary_key = None;
    let mut secondary = Vec::new();
    for (name, parts) in by_name {
        let first = parts[0];
        let primary = name == "PRIMARY";
        let (index_type, unique) = index_type_and_unique(first);

        let index_parts = parts
            .iter()
            .map(|row| IndexPart {
                column: row.get_string("column_name"),
                prefix_length: fixups::normalize_index_sub_part(row.get_u64("sub_part")).map(|n| n as u32),
                descending: row.get_str("collation") == Some("D"),
                expression: row.get_opt_string("expression"),
            })
            .collect();

        let fulltext_parser =
            (index_type == IndexType::FullText).then(|| fixups::recover_fulltext_parser_from_show_create(show_create, &name)).flatten();

        let index = Index {
            name: name.clone(),
            index_type,
            unique: unique || primary,
            primary,
            parts: index_parts,
            invisible: false,
            fulltext_parser,
            comment: first.get_string("index_comment"),
        };

        if primary {
            primary_key = Some(index);
        } else {
            secondary.push(index);
        }
    }
    (primary_key, secondary)
}

fn build_foreign_keys(key_column_rows: &[SqlRow], referential_rows: &[SqlRow], flavor: Flavor) -> Vec<ForeignKey> {
    let rules: BTreeMap<String, (String, String)> = referential_rows
        .iter()
        .map(|row| {
            (
                row.get_string("constraint_name"),
                (row.get_string("update_rule"), row.get_string("delete_rule")),
            )
        })
        .collect();

    let mut by_name: BTreeMap<String, Vec<&SqlRow>> = BTreeMap::new();
    for row in key_column_rows {
        by_name.entry(row.get_string("constraint_name")).or_default().push(row);
    }

    let mut foreign_keys: Vec<ForeignKey> = by_name
        .into_iter()
        .map(|(name, rows)| {
            let (update_rule, delete_rule) = rules
                .get(&name)
                .cloned()
                .unwrap_or_else(|| ("RESTRICT".to_string(), "RESTRICT".to_string()));
            let first = rows[0];
            ForeignKey {
                name,
                columns: rows.iter().map(|r| r.get_string("column_name")).collect(),
                referenced_schema: first.get_string("referenced_table_schema"),
                referenced_table: first.get_string("referenced_table_name"),
                referenced_columns: rows.iter().map(|r| r.get_string("referenced_column_name")).collect(),
                on_delete: parse_action(fixups::normalize_implicit_no_action(&delete_rule)),
                on_update: parse_action(fixups::normalize_implicit_no_action(&update_rule)),
            }
        })
        .collect();

    if flavor.sorted_foreign_keys() {
        foreign_keys.sort_by(|a, b| a.name.cmp(&b.name));
    }
    foreign_keys
}

fn parse_action(rule: &str) -> ReferentialAction {
    match rule {
        "CASCADE" => ReferentialAction::Cascade,
        "SET NULL" => ReferentialAction::SetNull,
        "SET DEFAULT" => ReferentialAction::SetDefault,
        "NO ACTION" => ReferentialAction::NoAction,
        _ => ReferentialAction::Restrict,
    }
}

fn parse_partition_method(raw: &str) -> PartitionMethod {
    match raw.to_ascii_uppercase().as_str() {
        "RANGE" => PartitionMethod::Range,
        "RANGE COLUMNS" => PartitionMethod::RangeColumns,
        "LIST" => PartitionMethod::List,
        "LIST COLUMNS" => PartitionMethod::ListColumns,
        "LINEAR HASH" => PartitionMethod::LinearHash,
        "LINEAR KEY" => PartitionMethod::LinearKey,
        "KEY" => PartitionMethod::Key,
        _ => PartitionMethod::Hash,
    }
}

fn build_partitioning(rows: &[SqlRow], show_create: &str) -> Option<Partitioning> {
    let first = rows.first()?;
    let method = parse_partition_method(&first.get_string("partition_method"));
    let sub_method = first.get_opt_string("subpartition_method").map(|m| parse_partition_method(&m));
    let expression = fixups::strip_partition_expression_backticks(&first.get_string("partition_expression"));
    let sub_expression = first
        .get_opt_string("subpartition_expression")
        .map(|e| fixups::strip_partition_expression_backticks(&e));

    let partitions = rows
        .iter()
        .map(|row| {
            let name = row.get_string("partition_name");
            let data_directory = row
                .get_opt_string("data_directory")
                .or_else(|| fixups::recover_partition_data_directory(show_create, &name));
            PartitionDef {
                name,
                sub_name: row.get_opt_string("subpartition_name"),
                value: row.get_string("partition_description"),
                data_directory,
                comment: fixups::unescape_show_create_comment(&row.get_string("partition_comment")),
            }
        })
        .collect();

    let uses_key_algorithm = matches!(method, PartitionMethod::Key | PartitionMethod::LinearKey)
        || matches!(sub_method, Some(PartitionMethod::Key | PartitionMethod::LinearKey));
    let algorithm = uses_key_algorithm.then(|| fixups::recover_partition_algorithm(show_create)).flatten();

    let render_mode = if method.is_hash_or_key() {
        fixups::infer_hash_or_key_render_mode(show_create)
    } else {
        PartitionRenderMode::Default
    };

    Some(Partitioning {
        method,
        sub_method,
        expression,
        sub_expression,
        partitions,
        render_mode,
        algorithm,
    })
}

fn row_to_routine(row: &SqlRow) -> Routine {
    Routine {
        name: row.get_string("routine_name"),
        kind: if row.get_string("routine_type") == "FUNCTION" {
            RoutineKind::Function
        } else {
            RoutineKind::Procedure
        },
        definition: row.get_string("routine_definition"),
        sql_mode: row.get_string("sql_mode"),
        definer: row.get_string("definer"),
    }
}
