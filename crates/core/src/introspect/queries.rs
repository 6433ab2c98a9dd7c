//! The `information_schema` queries the introspector issues. Kept as plain
//! constants/format strings rather than a query builder: none of these vary
//! in shape across flavors, only in which rows come back.
//!
//! Every selected column carries an explicit lower-case `AS` alias. Drivers
//! differ on the case they hand back for unaliased columns (some follow the
//! catalog's declared case, some fold to upper-case under certain server
//! collations), and [`super::adapter::SqlRow::get`] is keyed on these exact
//! literal strings, so the alias is what actually pins the contract down.

pub const SCHEMA_QUERY: &str = "\
SELECT default_character_set_name AS default_character_set_name,
       default_collation_name AS default_collation_name
FROM information_schema.schemata
WHERE schema_name = ?";

pub const TABLES_QUERY: &str = "\
SELECT t.table_name AS table_name,
       t.engine AS engine,
       t.row_format AS row_format,
       t.table_comment AS table_comment,
       t.auto_increment AS auto_increment,
       t.create_options AS create_options,
       t.table_collation AS collation,
       c.character_set_name AS charset
FROM information_schema.tables t
LEFT JOIN information_schema.collations c ON c.collation_name = t.table_collation
WHERE t.table_schema = ? AND t.table_type = 'BASE TABLE'
ORDER BY t.table_name";

pub const COLUMNS_QUERY: &str = "\
SELECT column_name AS column_name,
       column_type AS column_type,
       is_nullable AS is_nullable,
       column_default AS column_default,
       extra AS extra,
       character_set_name AS character_set_name,
       collation_name AS collation_name,
       column_comment AS column_comment,
       generation_expression AS generation_expression,
       ordinal_position AS ordinal_position
FROM information_schema.columns
WHERE table_schema = ? AND table_name = ?
ORDER BY ordinal_position";

pub const STATISTICS_QUERY: &str = "\
SELECT index_name AS index_name,
       non_unique AS non_unique,
       column_name AS column_name,
       sub_part AS sub_part,
       collation AS collation,
       seq_in_index AS seq_in_index,
       index_type AS index_type,
       index_comment AS index_comment,
       expression AS expression
FROM information_schema.statistics
WHERE table_schema = ? AND table_name = ?
ORDER BY index_name, seq_in_index";

pub const KEY_COLUMN_USAGE_QUERY: &str = "\
SELECT constraint_name AS constraint_name,
       column_name AS column_name,
       ordinal_position AS ordinal_position,
       referenced_table_schema AS referenced_table_schema,
       referenced_table_name AS referenced_table_name,
       referenced_column_name AS referenced_column_name
FROM information_schema.key_column_usage
WHERE table_schema = ? AND table_name = ? AND referenced_table_name IS NOT NULL
ORDER BY constraint_name, ordinal_position";

pub const REFERENTIAL_CONSTRAINTS_QUERY: &str = "\
SELECT constraint_name AS constraint_name,
       update_rule AS update_rule,
       delete_rule AS delete_rule
FROM information_schema.referential_constraints
WHERE constraint_schema = ? AND table_name = ?";

pub const PARTITIONS_QUERY: &str = "\
SELECT partition_method AS partition_method,
       partition_expression AS partition_expression,
       subpartition_method AS subpartition_method,
       subpartition_expression AS subpartition_expression,
       partition_name AS partition_name,
       subpartition_name AS subpartition_name,
       partition_description AS partition_description,
       partition_comment AS partition_comment,
       data_directory AS data_directory
FROM information_schema.partitions
WHERE table_schema = ? AND table_name = ? AND partition_name IS NOT NULL
ORDER BY partition_ordinal_position, subpartition_ordinal_position";

pub const ROUTINES_QUERY: &str = "\
SELECT routine_name AS routine_name,
       routine_type AS routine_type,
       routine_definition AS routine_definition,
       sql_mode AS sql_mode,
       definer AS definer
FROM information_schema.routines
WHERE routine_schema = ?
ORDER BY routine_name";

#[must_use]
pub fn show_create_table(schema: &str, table: &str) -> String {
    format!("SHOW CREATE TABLE `{schema}`.`{table}`")
}

#[must_use]
pub fn show_create_procedure(schema: &str, name: &str) -> String {
    format!("SHOW CREATE PROCEDURE `{schema}`.`{name}`")
}

#[must_use]
pub fn show_create_function(schema: &str, name: &str) -> String {
    format!("SHOW CREATE FUNCTION `{schema}`.`{name}`")
}
