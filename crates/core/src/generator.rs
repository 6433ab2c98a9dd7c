//! C6: renders a [`Table`] back into the `CREATE TABLE` statement a server
//! would print for it. Pure function of the object model plus [`Flavor`];
//! no I/O. The diff verifier depends on this being byte-identical to what
//! the server actually emits for an unmodified table.

use crate::flavor::Flavor;
use crate::quoting::{escape_identifier, quote_literal};
use crate::schema::{
    Column, ColumnDefault, ForeignKey, Index, IndexPart, IndexType, PartitionMethod, PartitionRenderMode,
    Partitioning, ReferentialAction, Table,
};
use crate::types::{parse as parse_type, strip_int_display_width};

#[must_use]
pub fn generate_create_table(table: &Table, flavor: Flavor) -> String {
    let mut lines: Vec<String> = Vec::new();
    for column in &table.columns {
        lines.push(format!("  {}", render_column_definition(column, flavor)));
    }
    if let Some(pk) = &table.primary_key {
        lines.push(format!("  {}", index_clause(pk)));
    }
    for index in &table.secondary_indexes {
        lines.push(format!("  {}", index_clause(index)));
    }
    // Rule 4: foreign keys are rendered in alphabetical order regardless of
    // how `table.foreign_keys` happens to be ordered, so this holds whether
    // the table came from the introspector (which already sorts on modern
    // flavors) or was hand-assembled by a differ.
    let mut foreign_keys: Vec<&ForeignKey> = table.foreign_keys.iter().collect();
    foreign_keys.sort_by(|a, b| a.name.cmp(&b.name));
    for fk in foreign_keys {
        lines.push(format!("  {}", foreign_key_clause(fk)));
    }

    let mut out = format!("CREATE TABLE {} (\n{}\n)", escape_identifier(&table.name), lines.join(",\n"));
    out.push_str(&table_options(table));
    if let Some(partitioning) = &table.partitioning {
        out.push('\n');
        out.push_str(&partition_clause(partitioning));
    }
    out
}

fn is_numeric_type(column_type: &str) -> bool {
    let parsed = parse_type(column_type);
    matches!(
        parsed.base.as_str(),
        "tinyint"
            | "smallint"
            | "mediumint"
            | "int"
            | "integer"
            | "bigint"
            | "decimal"
            | "numeric"
            | "dec"
            | "fixed"
            | "float"
            | "double"
            | "real"
            | "bit"
    )
}

fn is_blob_or_text(column_type: &str) -> bool {
    let base = parse_type(column_type).base;
    matches!(
        base.as_str(),
        "tinyblob" | "blob" | "mediumblob" | "longblob" | "tinytext" | "text" | "mediumtext" | "longtext" | "json"
    )
}

fn default_clause(column: &Column, flavor: Flavor) -> Option<String> {
    if is_blob_or_text(&column.column_type) && !flavor.allows_blob_defaults() {
        // Versions before MySQL 8.0.13 (and non-MariaDB flavors without the
        // backport) can't store a default on a blob/text column at all; a
        // `Table` built for such a flavor should never render one.
        return None;
    }
    match &column.default {
        ColumnDefault::None => None,
        ColumnDefault::Null => Some("DEFAULT NULL".to_string()),
        ColumnDefault::Literal(value) => {
            if is_numeric_type(&column.column_type) {
                Some(format!("DEFAULT {value}"))
            } else {
                Some(format!("DEFAULT {}", quote_literal(value)))
            }
        }
        ColumnDefault::Expression(expr) => Some(format!("DEFAULT ({expr})")),
        ColumnDefault::CurrentTimestamp { fsp } => {
            if *fsp > 0 {
                Some(format!("DEFAULT CURRENT_TIMESTAMP({fsp})"))
            } else {
                Some("DEFAULT CURRENT_TIMESTAMP".to_string())
            }
        }
    }
}

fn rendered_column_type(column_type: &str, flavor: Flavor) -> String {
    if flavor.omits_int_display_width() {
        strip_int_display_width(column_type)
    } else {
        column_type.to_string()
    }
}

pub(crate) fn render_column_definition(column: &Column, flavor: Flavor) -> String {
    let mut parts = vec![escape_identifier(&column.name), rendered_column_type(&column.column_type, flavor)];

    if let Some(generated) = &column.generated {
        if flavor.supports_generated_columns() {
            parts.push(format!("GENERATED ALWAYS AS ({})", generated.expression));
            parts.push(if generated.stored { "STORED" } else { "VIRTUAL" }.to_string());
        }
    }

    parts.push(if column.nullable { "NULL" } else { "NOT NULL" }.to_string());

    if let Some(default) = default_clause(column, flavor) {
        parts.push(default);
    }

    if column.on_update_current_timestamp {
        parts.push("ON UPDATE CURRENT_TIMESTAMP".to_string());
    }

    if column.auto_increment {
        parts.push("AUTO_INCREMENT".to_string());
    }

    if column.invisible && flavor.supports_invisible_indexes() {
        parts.push("INVISIBLE".to_string());
    }

    if column.compressed && flavor.supports_column_compression() {
        parts.push("COLUMN_FORMAT COMPRESSED".to_string());
    }

    if !column.comment.is_empty() {
        parts.push(format!("COMMENT {}", quote_literal(&column.comment)));
    }

    parts.join(" ")
}

fn index_part_clause(part: &IndexPart) -> String {
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

fn index_clause(index: &Index) -> String {
    let columns = index
        .parts
        .iter()
        .map(index_part_clause)
        .collect::<Vec<_>>()
        .join(",");

    let head = if index.primary {
        "PRIMARY KEY".to_string()
    } else {
        match index.index_type {
            IndexType::FullText => format!("FULLTEXT KEY {}", escape_identifier(&index.name)),
            IndexType::Spatial => format!("SPATIAL KEY {}", escape_identifier(&index.name)),
            IndexType::Btree | IndexType::Hash => {
                let keyword = if index.unique { "UNIQUE KEY" } else { "KEY" };
                format!("{keyword} {}", escape_identifier(&index.name))
            }
        }
    };

    let mut clause = format!("{head} ({columns})");
    if index.index_type == IndexType::Hash {
        clause.push_str(" USING HASH");
    }
    if let Some(parser) = &index.fulltext_parser {
        clause.push_str(&format!(" WITH PARSER {}", escape_identifier(parser)));
    }
    if index.invisible {
        clause.push_str(" /*!80000 INVISIBLE */");
    }
    if !index.comment.is_empty() {
        clause.push_str(&format!(" COMMENT {}", quote_literal(&index.comment)));
    }
    clause
}

fn foreign_key_clause(fk: &ForeignKey) -> String {
    let columns = fk
        .columns
        .iter()
        .map(|c| escape_identifier(c))
        .collect::<Vec<_>>()
        .join(",");
    let referenced_columns = fk
        .referenced_columns
        .iter()
        .map(|c| escape_identifier(c))
        .collect::<Vec<_>>()
        .join(",");

    let mut clause = format!(
        "CONSTRAINT {} FOREIGN KEY ({columns}) REFERENCES {} ({referenced_columns})",
        escape_identifier(&fk.name),
        escape_identifier(&fk.referenced_table)
    );
    if fk.on_delete != ReferentialAction::Restrict {
        clause.push_str(&format!(" ON DELETE {}", fk.on_delete.as_sql()));
    }
    if fk.on_update != ReferentialAction::Restrict {
        clause.push_str(&format!(" ON UPDATE {}", fk.on_update.as_sql()));
    }
    clause
}

fn table_options(table: &Table) -> String {
    let mut out = format!(" ENGINE={}", table.engine);
    if let Some(auto_increment) = table.auto_increment {
        out.push_str(&format!(" AUTO_INCREMENT={auto_increment}"));
    }
    out.push_str(&format!(" DEFAULT CHARSET={}", table.charset));
    if !table.collation.is_empty() {
        out.push_str(&format!(" COLLATE={}", table.collation));
    }
    if let Some(row_format) = &table.row_format {
        if row_format != "Default" {
            out.push_str(&format!(" ROW_FORMAT={}", row_format.to_ascii_uppercase()));
        }
    }
    if !table.create_options.is_empty() {
        out.push(' ');
        out.push_str(&table.create_options);
    }
    if !table.comment.is_empty() {
        out.push_str(&format!(" COMMENT={}", quote_literal(&table.comment)));
    }
    out
}

fn partition_method_sql(method: PartitionMethod) -> &'static str {
    method.as_sql()
}

fn partition_def_clause(method: PartitionMethod, def: &crate::schema::PartitionDef) -> String {
    let mut clause = format!("PARTITION {}", escape_identifier(&def.name));
    if !method.is_hash_or_key() {
        clause.push_str(&format!(" VALUES {}", def.value));
    }
    if let Some(sub_name) = &def.sub_name {
        clause.push_str(&format!(" (SUBPARTITION {}", escape_identifier(sub_name)));
        if let Some(dir) = &def.data_directory {
            clause.push_str(&format!(" DATA DIRECTORY = {}", quote_literal(dir)));
        }
        clause.push(')');
    } else if let Some(dir) = &def.data_directory {
        clause.push_str(&format!(" DATA DIRECTORY = {}", quote_literal(dir)));
    }
    if !def.comment.is_empty() {
        clause.push_str(&format!(" COMMENT {}", quote_literal(&def.comment)));
    }
    clause
}

pub(crate) fn partition_clause(partitioning: &Partitioning) -> String {
    let mut clause = format!(
        "PARTITION BY {} ({})",
        partition_method_sql(partitioning.method),
        partitioning.expression
    );
    if let Some(algorithm) = &partitioning.algorithm {
        clause.push_str(&format!(" ALGORITHM={algorithm}"));
    }
    if let Some(sub_method) = partitioning.sub_method {
        let sub_expression = partitioning.sub_expression.as_deref().unwrap_or_default();
        clause.push_str(&format!("\nSUBPARTITION BY {} ({sub_expression})", partition_method_sql(sub_method)));
    }

    match partitioning.render_mode {
        PartitionRenderMode::None => {}
        PartitionRenderMode::CountClause => {
            clause.push_str(&format!("\nPARTITIONS {}", partitioning.partitions.len()));
        }
        PartitionRenderMode::Default | PartitionRenderMode::ExplicitList => {
            let partitions = partitioning
                .partitions
                .iter()
                .map(|p| partition_def_clause(partitioning.method, p))
                .collect::<Vec<_>>()
                .join(",\n ");
            clause.push_str(&format!("\n({partitions})"));
        }
    }
    clause
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flavor::Vendor;
    use crate::schema::{ColumnDefault, IndexPart};

    fn flavor() -> Flavor {
        Flavor::new(Vendor::MySql, 8, 0, 34)
    }

    fn simple_column(name: &str, column_type: &str, nullable: bool) -> Column {
        Column {
            name: name.to_string(),
            column_type: column_type.to_string(),
            nullable,
            default: ColumnDefault::None,
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

    fn bare_table(name: &str) -> Table {
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
    fn renders_minimal_table() {
        let mut id = simple_column("id", "int unsigned", false);
        id.auto_increment = true;
        let mut table = bare_table("widgets");
        table.auto_increment = Some(1);
        table.columns = vec![id];
        table.primary_key = Some(Index {
            name: "PRIMARY".to_string(),
            index_type: IndexType::Btree,
            unique: true,
            primary: true,
            parts: vec![IndexPart {
                column: "id".to_string(),
                prefix_length: None,
                descending: false,
                expression: None,
            }],
            invisible: false,
            fulltext_parser: None,
            comment: String::new(),
        });

        let ddl = generate_create_table(&table, flavor());
        assert_eq!(
            ddl,
            "CREATE TABLE `widgets` (\n  `id` int unsigned NOT NULL AUTO_INCREMENT,\n  PRIMARY KEY (`id`)\n) ENGINE=InnoDB AUTO_INCREMENT=1 DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_0900_ai_ci"
        );
    }

    #[test]
    fn numeric_default_is_unquoted_string_default_is_quoted() {
        let mut price = simple_column("price", "decimal(10,2)", false);
        price.default = ColumnDefault::Literal("0.00".to_string());
        assert_eq!(render_column_definition(&price, flavor()), "`price` decimal(10,2) NOT NULL DEFAULT 0.00");

        let mut status = simple_column("status", "varchar(16)", false);
        status.default = ColumnDefault::Literal("active".to_string());
        assert_eq!(
            render_column_definition(&status, flavor()),
            "`status` varchar(16) NOT NULL DEFAULT 'active'"
        );
    }

    #[test]
    fn display_width_stripped_on_modern_flavor_only() {
        let id = simple_column("id", "int(11)", false);
        assert_eq!(render_column_definition(&id, flavor()), "`id` int NOT NULL");
        let old_flavor = Flavor::new(Vendor::MySql, 5, 7, 40);
        assert_eq!(render_column_definition(&id, old_flavor), "`id` int(11) NOT NULL");
    }

    #[test]
    fn blob_default_suppressed_when_flavor_forbids_it() {
        let mut body = simple_column("body", "text", true);
        body.default = ColumnDefault::Expression("('')".to_string());
        let old_flavor = Flavor::new(Vendor::MySql, 5, 7, 40);
        assert_eq!(render_column_definition(&body, old_flavor), "`body` text NULL");
        assert_eq!(render_column_definition(&body, flavor()), "`body` text NULL DEFAULT ('')");
    }

    #[test]
    fn foreign_keys_are_sorted_alphabetically_regardless_of_storage_order() {
        let mut table = bare_table("orders");
        table.columns = vec![simple_column("a_id", "int", false), simple_column("b_id", "int", false)];
        table.foreign_keys = vec![
            ForeignKey {
                name: "fk_zz".to_string(),
                columns: vec!["b_id".to_string()],
                referenced_schema: "s".to_string(),
                referenced_table: "b".to_string(),
                referenced_columns: vec!["id".to_string()],
                on_delete: ReferentialAction::Restrict,
                on_update: ReferentialAction::Restrict,
            },
            ForeignKey {
                name: "fk_aa".to_string(),
                columns: vec!["a_id".to_string()],
                referenced_schema: "s".to_string(),
                referenced_table: "a".to_string(),
                referenced_columns: vec!["id".to_string()],
                on_delete: ReferentialAction::Restrict,
                on_update: ReferentialAction::Restrict,
            },
        ];
        let ddl = generate_create_table(&table, flavor());
        let fk_zz_pos = ddl.find("fk_zz").unwrap();
        let fk_aa_pos = ddl.find("fk_aa").unwrap();
        assert!(fk_aa_pos < fk_zz_pos);
    }

    #[test]
    fn fulltext_index_with_parser_renders_with_parser_clause() {
        let index = Index {
            name: "ft_body".to_string(),
            index_type: IndexType::FullText,
            unique: false,
            primary: false,
            parts: vec![IndexPart { column: "body".to_string(), prefix_length: None, descending: false, expression: None }],
            invisible: false,
            fulltext_parser: Some("ngram".to_string()),
            comment: String::new(),
        };
        assert_eq!(index_clause(&index), "FULLTEXT KEY `ft_body` (`body`) WITH PARSER `ngram`");
    }
}
