//! Reconciliation between `information_schema` and `SHOW CREATE TABLE`.
//! Each server version has its own set of small inconsistencies between the
//! two; rather than spread version checks through the row-mapping code,
//! every quirk gets its own small, independently testable function here.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::flavor::Flavor;
use crate::schema::PartitionRenderMode;

static BLOB_DEFAULT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)`([^`]+)`\s+\w[\w() ]*\s+DEFAULT\s+\((.+?)\)[,\n)]").expect("static regex is valid"));

static PARTITION_BACKTICK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+)`").expect("static regex is valid"));

static COMMENT_ESCAPE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\(.)").expect("static regex is valid"));

static NOOP_CREATE_OPTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*\b(STORAGE\s+\w+|COLUMN_FORMAT\s+\w+)\b").expect("static regex is valid"));

static PAGE_COMPRESSED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*\bPAGE_COMPRESSED\s*=\s*\d+\b").expect("static regex is valid"));

static CREATE_OPTIONS_SEGMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)(?:COLLATE=\S+|DEFAULT CHARSET=\S+)\s*(.*?)\s*(?:COMMENT=|$)").expect("static regex is valid")
});

static GENERATED_EXPR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)`([^`]+)`[^\n]*?GENERATED ALWAYS AS \((.+?)\)\s*(?:VIRTUAL|STORED)").expect("static regex is valid")
});

static FULLTEXT_PARSER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)FULLTEXT KEY `([^`]+)`[^\n]*?WITH PARSER `([^`]+)`").expect("static regex is valid")
});

static PARTITION_ALGORITHM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"ALGORITHM\s*=\s*(\d+)").expect("static regex is valid"));

static PARTITION_DATA_DIRECTORY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)PARTITION `([^`]+)`[^\n]*?DATA DIRECTORY\s*=\s*'([^']*)'"#).expect("static regex is valid")
});

/// MySQL 8.0.13-8.0.22 leave `information_schema.columns.column_default`
/// NULL for blob/text/json columns with an expression default; the
/// expression has to be recovered from `SHOW CREATE TABLE` instead. Returns
/// the expression text for `column`, unescaped of its surrounding `()`.
#[must_use]
pub fn recover_blob_default_from_show_create(show_create: &str, column: &str, flavor: Flavor) -> Option<String> {
    if !flavor.needs_blob_default_fixup() {
        return None;
    }
    BLOB_DEFAULT_RE.captures_iter(show_create).find_map(|captures| {
        if captures.get(1)?.as_str() == column {
            Some(captures.get(2)?.as_str().to_string())
        } else {
            None
        }
    })
}

/// `information_schema.partitions.partition_expression` always wraps
/// column references in back-quotes (e.g. `` `store_id` ``); the engine's
/// own object model stores partition expressions unquoted so they compare
/// equal to a user's `PARTITION BY` clause in source control.
#[must_use]
pub fn strip_partition_expression_backticks(expression: &str) -> String {
    PARTITION_BACKTICK_RE.replace_all(expression, "$1").into_owned()
}

/// `information_schema.statistics.sub_part` is `0` rather than `NULL` on
/// some server/connector combinations when an index part covers the whole
/// column. Normalizes both to `None`.
#[must_use]
pub fn normalize_index_sub_part(sub_part: Option<u64>) -> Option<u64> {
    sub_part.filter(|&n| n > 0)
}

/// `information_schema.referential_constraints` reports `NO ACTION` for a
/// foreign key that was declared with no explicit `ON DELETE`/`ON UPDATE`
/// clause, but MySQL's actual enforced behavior in that case is `RESTRICT`.
/// `SHOW CREATE TABLE` always shows the effective action, so that's what
/// the object model should carry.
#[must_use]
pub fn normalize_implicit_no_action(rule: &str) -> &'static str {
    match rule.to_ascii_uppercase().as_str() {
        "CASCADE" => "CASCADE",
        "SET NULL" => "SET NULL",
        "SET DEFAULT" => "SET DEFAULT",
        _ => "RESTRICT",
    }
}

/// A table with an `AUTO_INCREMENT` column can report its next value as `0`
/// on some server/connector combinations (observed right after the table
/// was created with no rows inserted yet), even though the next value
/// actually handed out is `1`. Normalizes that case; a table without an
/// auto-increment column never has a meaningful next value, so `None` wins
/// regardless of what `information_schema` reported.
#[must_use]
pub fn normalize_stale_auto_increment(auto_increment: Option<u64>, has_auto_increment_column: bool) -> Option<u64> {
    if !has_auto_increment_column {
        return None;
    }
    match auto_increment {
        Some(0) => Some(1),
        other => other,
    }
}

/// `SHOW CREATE TABLE` backslash-escapes characters inside a `COMMENT`
/// string that don't need escaping in the round-tripped object-model form
/// (e.g. `\'` where a plain `'` would do once re-quoted by the generator).
/// Collapses any such escape down to the bare character.
#[must_use]
pub fn unescape_show_create_comment(comment: &str) -> String {
    COMMENT_ESCAPE_RE.replace_all(comment, "$1").into_owned()
}

/// InnoDB's `information_schema.tables.create_options` can carry `STORAGE
/// DISK`/`COLUMN_FORMAT DYNAMIC` and similar no-op defaults that a hand
/// written schema file would never spell out. Stripped so the round-trip
/// comparison against a regenerated `CREATE TABLE` doesn't flag a table as
/// unsupported over text nobody actually wrote.
#[must_use]
pub fn strip_noop_innodb_create_options(create_options: &str, engine: &str) -> String {
    if !engine.eq_ignore_ascii_case("InnoDB") {
        return create_options.to_string();
    }
    NOOP_CREATE_OPTION_RE.replace_all(create_options, "").trim().to_string()
}

/// Percona's `PAGE_COMPRESSED=1` table option is meaningless on a flavor
/// that doesn't support page compression at all; a table moved off Percona
/// can still carry the leftover clause in its stored `create_options`.
#[must_use]
pub fn strip_page_compressed_if_unsupported(create_options: &str, flavor: Flavor) -> String {
    if flavor.supports_page_compression() {
        return create_options.to_string();
    }
    PAGE_COMPRESSED_RE.replace_all(create_options, "").trim().to_string()
}

/// Reorders `items` in place to match the order their `name_of` values
/// appear in `show_create`. An item whose name can't be found keeps its
/// relative position at the end, stably with respect to other not-found
/// items.
pub fn reorder_by_show_create<T>(items: &mut [T], show_create: &str, name_of: impl Fn(&T) -> &str) {
    items.sort_by_key(|item| show_create.find(&format!("`{}`", name_of(item))).unwrap_or(usize::MAX));
}

/// Some server versions print the table's `create_options` fragment
/// word-order-normalized (e.g. alphabetized) in `information_schema`, but
/// `SHOW CREATE TABLE` always prints what the user actually declared. Pulls
/// the raw options text back out of the table-options line.
#[must_use]
pub fn extract_create_options_from_show_create(show_create: &str) -> Option<String> {
    let captures = CREATE_OPTIONS_SEGMENT_RE.captures(show_create)?;
    let segment = captures.get(1)?.as_str().trim();
    if segment.is_empty() {
        None
    } else {
        Some(segment.to_string())
    }
}

/// `information_schema.columns.generation_expression` can normalize string
/// literal charsets inside the expression differently than the user wrote
/// them; re-extracts the expression text verbatim from `SHOW CREATE TABLE`.
#[must_use]
pub fn recover_generated_expression_from_show_create(show_create: &str, column: &str) -> Option<String> {
    GENERATED_EXPR_RE.captures_iter(show_create).find_map(|captures| {
        if captures.get(1)?.as_str() == column {
            Some(captures.get(2)?.as_str().to_string())
        } else {
            None
        }
    })
}

/// Percona Server attaches `COLUMN_FORMAT COMPRESSED` to a column's own
/// definition line when page compression is enabled for it;
/// `information_schema.columns` has no field for this at all.
#[must_use]
pub fn column_is_compressed_in_show_create(show_create: &str, column: &str) -> bool {
    let needle = format!("`{column}`");
    show_create
        .lines()
        .any(|line| line.trim_start().starts_with(&needle) && line.contains("COLUMN_FORMAT COMPRESSED"))
}

/// Attaches the `WITH PARSER` plugin name declared on a FULLTEXT index's
/// own line; `information_schema.statistics` has no column for this.
#[must_use]
pub fn recover_fulltext_parser_from_show_create(show_create: &str, index_name: &str) -> Option<String> {
    FULLTEXT_PARSER_RE.captures_iter(show_create).find_map(|captures| {
        if captures.get(1)?.as_str() == index_name {
            Some(captures.get(2)?.as_str().to_string())
        } else {
            None
        }
    })
}

/// A HASH/KEY-partitioned table's `information_schema.partitions` rows
/// always carry one row per partition, but the user's original `PARTITION
/// BY ... (...)` clause might have been an explicit partition list, a bare
/// `PARTITIONS n` count clause, or nothing at all (an implicit single
/// partition count). Only meaningful to call for a HASH/KEY method; RANGE
/// and LIST partitioning always render as an explicit list.
#[must_use]
pub fn infer_hash_or_key_render_mode(show_create: &str) -> PartitionRenderMode {
    if !show_create.contains("PARTITION BY") {
        return PartitionRenderMode::None;
    }
    if show_create.contains("\n(PARTITION ") || show_create.contains(" (PARTITION ") {
        PartitionRenderMode::ExplicitList
    } else if show_create.contains("PARTITIONS ") {
        PartitionRenderMode::CountClause
    } else {
        PartitionRenderMode::Default
    }
}

/// KEY partitioning can declare `ALGORITHM=1`/`ALGORITHM=2` to pin the
/// hashing algorithm used; `information_schema.partitions` doesn't surface
/// it at all.
#[must_use]
pub fn recover_partition_algorithm(show_create: &str) -> Option<String> {
    PARTITION_ALGORITHM_RE.captures(show_create).map(|c| c[1].to_string())
}

/// Attaches a partition's `DATA DIRECTORY` path, read off its own clause in
/// `SHOW CREATE TABLE`; `information_schema.partitions` carries this in a
/// column on some versions but not others, so it's always re-derived here.
#[must_use]
pub fn recover_partition_data_directory(show_create: &str, partition_name: &str) -> Option<String> {
    PARTITION_DATA_DIRECTORY_RE.captures_iter(show_create).find_map(|captures| {
        if captures.get(1)?.as_str() == partition_name {
            let dir = captures.get(2)?.as_str();
            if dir.is_empty() {
                None
            } else {
                Some(dir.to_string())
            }
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flavor::{Flavor, Vendor};

    const FROZEN_CREATE: &str = "CREATE TABLE `t` (\n  `payload` text DEFAULT (_utf8mb4'{}')\n) ENGINE=InnoDB";

    #[test]
    fn recovers_blob_default_only_on_gated_flavor() {
        let gated = Flavor::new(Vendor::MySql, 8, 0, 18);
        let ungated = Flavor::new(Vendor::MySql, 8, 0, 23);
        assert_eq!(
            recover_blob_default_from_show_create(FROZEN_CREATE, "payload", gated),
            Some("_utf8mb4'{}'".to_string())
        );
        assert_eq!(recover_blob_default_from_show_create(FROZEN_CREATE, "payload", ungated), None);
    }

    #[test]
    fn strips_partition_backticks() {
        assert_eq!(strip_partition_expression_backticks("`store_id`"), "store_id");
        assert_eq!(
            strip_partition_expression_backticks("year(`created_at`)"),
            "year(created_at)"
        );
    }

    #[test]
    fn normalizes_zero_sub_part_to_none() {
        assert_eq!(normalize_index_sub_part(Some(0)), None);
        assert_eq!(normalize_index_sub_part(Some(10)), Some(10));
        assert_eq!(normalize_index_sub_part(None), None);
    }

    #[test]
    fn implicit_no_action_becomes_restrict() {
        assert_eq!(normalize_implicit_no_action("NO ACTION"), "RESTRICT");
        assert_eq!(normalize_implicit_no_action("CASCADE"), "CASCADE");
    }

    #[test]
    fn stale_auto_increment_is_cleared() {
        assert_eq!(normalize_stale_auto_increment(Some(42), false), None);
        assert_eq!(normalize_stale_auto_increment(Some(42), true), Some(42));
    }

    #[test]
    fn zero_next_value_is_normalized_to_one() {
        assert_eq!(normalize_stale_auto_increment(Some(0), true), Some(1));
        assert_eq!(normalize_stale_auto_increment(Some(0), false), None);
        assert_eq!(normalize_stale_auto_increment(None, true), None);
    }

    #[test]
    fn unescapes_show_create_comment() {
        assert_eq!(unescape_show_create_comment("it\\'s fine"), "it's fine");
    }

    #[test]
    fn strips_noop_innodb_create_options_only_for_innodb() {
        assert_eq!(strip_noop_innodb_create_options("STORAGE DISK COLUMN_FORMAT DYNAMIC", "InnoDB"), "");
        assert_eq!(
            strip_noop_innodb_create_options("STORAGE DISK COLUMN_FORMAT DYNAMIC", "MyISAM"),
            "STORAGE DISK COLUMN_FORMAT DYNAMIC"
        );
        assert_eq!(strip_noop_innodb_create_options("ENCRYPTION='Y'", "InnoDB"), "ENCRYPTION='Y'");
    }

    #[test]
    fn strips_page_compressed_only_when_unsupported() {
        let percona = Flavor::new(Vendor::Percona, 5, 7, 40);
        let mysql = Flavor::new(Vendor::MySql, 8, 0, 34);
        assert_eq!(strip_page_compressed_if_unsupported("PAGE_COMPRESSED=1", percona), "PAGE_COMPRESSED=1");
        assert_eq!(strip_page_compressed_if_unsupported("PAGE_COMPRESSED=1", mysql), "");
    }

    #[test]
    fn reorders_items_by_show_create_position() {
        let show_create = "CREATE TABLE `t` (\n  KEY `b_idx` (`b`),\n  KEY `a_idx` (`a`)\n)";
        let mut names = vec!["a_idx".to_string(), "b_idx".to_string()];
        reorder_by_show_create(&mut names, show_create, |s| s.as_str());
        assert_eq!(names, vec!["b_idx".to_string(), "a_idx".to_string()]);
    }

    #[test]
    fn extracts_create_options_segment() {
        let show_create = "CREATE TABLE `t` (\n  `id` int\n) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_0900_ai_ci ENCRYPTION='Y' COMMENT='hi'";
        assert_eq!(extract_create_options_from_show_create(show_create), Some("ENCRYPTION='Y'".to_string()));
    }

    #[test]
    fn recovers_generated_expression() {
        let show_create = "CREATE TABLE `t` (\n  `full_name` varchar(100) GENERATED ALWAYS AS (concat(`first`,' ',`last`)) STORED\n)";
        assert_eq!(
            recover_generated_expression_from_show_create(show_create, "full_name"),
            Some("concat(`first`,' ',`last`)".to_string())
        );
    }

    #[test]
    fn detects_per_column_compression() {
        let show_create = "CREATE TABLE `t` (\n  `payload` blob COLUMN_FORMAT COMPRESSED,\n  `id` int\n)";
        assert!(column_is_compressed_in_show_create(show_create, "payload"));
        assert!(!column_is_compressed_in_show_create(show_create, "id"));
    }

    #[test]
    fn recovers_fulltext_parser() {
        let show_create = "CREATE TABLE `t` (\n  FULLTEXT KEY `ft_body` (`body`) WITH PARSER `ngram`\n)";
        assert_eq!(recover_fulltext_parser_from_show_create(show_create, "ft_body"), Some("ngram".to_string()));
        assert_eq!(recover_fulltext_parser_from_show_create(show_create, "ft_other"), None);
    }

    #[test]
    fn infers_partition_render_mode() {
        let explicit = "PARTITION BY HASH (id)\n(PARTITION p0 VALUES LESS THAN (1))";
        let counted = "PARTITION BY HASH (id)\nPARTITIONS 4";
        let bare = "PARTITION BY HASH (id)";
        let none = "CREATE TABLE `t` (`id` int)";
        assert_eq!(infer_hash_or_key_render_mode(explicit), PartitionRenderMode::ExplicitList);
        assert_eq!(infer_hash_or_key_render_mode(counted), PartitionRenderMode::CountClause);
        assert_eq!(infer_hash_or_key_render_mode(bare), PartitionRenderMode::Default);
        assert_eq!(infer_hash_or_key_render_mode(none), PartitionRenderMode::None);
    }

    #[test]
    fn recovers_partition_algorithm() {
        assert_eq!(recover_partition_algorithm("PARTITION BY KEY ALGORITHM=2 (id)"), Some("2".to_string()));
        assert_eq!(recover_partition_algorithm("PARTITION BY KEY (id)"), None);
    }

    #[test]
    fn recovers_partition_data_directory() {
        let show_create = "(PARTITION p0 VALUES LESS THAN (100) DATA DIRECTORY = '/data/p0' ENGINE = InnoDB)";
        assert_eq!(recover_partition_data_directory(show_create, "p0"), Some("/data/p0".to_string()));
        assert_eq!(recover_partition_data_directory(show_create, "p1"), None);
    }
}
