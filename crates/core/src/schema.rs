//! The object model the introspector populates and the differs compare:
//! [`Schema`], [`Table`], [`Column`], [`Index`], [`ForeignKey`],
//! [`Partitioning`] and [`Routine`]. Deliberately MySQL-shaped rather than a
//! generic cross-RDBMS IR: every field corresponds to something
//! `information_schema` or `SHOW CREATE TABLE` actually reports.

use std::collections::BTreeMap;

use crate::flavor::Flavor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub name: String,
    pub default_charset: String,
    pub default_collation: String,
    pub tables: Vec<Table>,
    pub routines: Vec<Routine>,
}

impl Schema {
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|table| table.name == name)
    }

    #[must_use]
    pub fn routine(&self, name: &str, kind: RoutineKind) -> Option<&Routine> {
        self.routines.iter().find(|r| r.name == name && r.kind == kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub name: String,
    pub engine: String,
    pub row_format: Option<String>,
    pub charset: String,
    pub collation: String,
    pub comment: String,
    /// The raw tail of `SHOW CREATE TABLE`'s table-options clause, minus the
    /// fields this model already captures explicitly (engine, charset,
    /// collation, row format, comment, auto-increment). Carries whatever is
    /// left over (`KEY_BLOCK_SIZE=8`, `COMPRESSION='ZLIB'`, ...) after
    /// [`crate::introspect::fixups`]'s no-op stripping.
    pub create_options: String,
    pub auto_increment: Option<u64>,
    pub columns: Vec<Column>,
    pub primary_key: Option<Index>,
    pub secondary_indexes: Vec<Index>,
    pub foreign_keys: Vec<ForeignKey>,
    pub partitioning: Option<Partitioning>,
    pub unsupported_for_diff: Option<String>,
}

impl Table {
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    #[must_use]
    pub fn columns_by_name(&self) -> BTreeMap<&str, &Column> {
        self.columns.iter().map(|c| (c.name.as_str(), c)).collect()
    }

    #[must_use]
    pub fn foreign_keys_by_name(&self) -> BTreeMap<&str, &ForeignKey> {
        self.foreign_keys.iter().map(|fk| (fk.name.as_str(), fk)).collect()
    }

    #[must_use]
    pub fn index(&self, name: &str) -> Option<&Index> {
        self.secondary_indexes.iter().find(|i| i.name == name)
    }

    #[must_use]
    pub fn has_auto_increment(&self) -> bool {
        self.columns.iter().any(|c| c.auto_increment)
    }

    /// The column order as declared in `CREATE TABLE`, used by the table
    /// differ's column-reordering heuristic.
    #[must_use]
    pub fn column_order(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub column_type: String,
    pub nullable: bool,
    pub default: ColumnDefault,
    pub auto_increment: bool,
    pub on_update_current_timestamp: bool,
    pub charset: Option<String>,
    pub collation: Option<String>,
    pub comment: String,
    pub generated: Option<GeneratedExpr>,
    pub compressed: bool,
    pub invisible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnDefault {
    None,
    Null,
    Literal(String),
    Expression(String),
    CurrentTimestamp { fsp: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedExpr {
    pub expression: String,
    pub stored: bool,
}

/// The server's physical index access method, orthogonal to uniqueness and
/// to primary-key-ness (see [`Index`]). `FullText`/`Spatial` are their own
/// access methods in MySQL, each with its own syntax, rather than a BTREE
/// index that merely happens to be unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    Btree,
    Hash,
    FullText,
    Spatial,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPart {
    pub column: String,
    pub prefix_length: Option<u32>,
    pub descending: bool,
    pub expression: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub name: String,
    pub index_type: IndexType,
    pub unique: bool,
    pub primary: bool,
    pub parts: Vec<IndexPart>,
    pub invisible: bool,
    pub fulltext_parser: Option<String>,
    pub comment: String,
}

impl Index {
    /// Primary > unique > plain, matching the ordering `Index.RedundantTo`
    /// needs: an index can only be redundant to another at least as unique
    /// as itself.
    fn uniqueness_rank(&self) -> u8 {
        if self.primary {
            2
        } else if self.unique {
            1
        } else {
            0
        }
    }

    /// True if every column/prefix this index covers is already a leading
    /// prefix of `other`, making this index redundant for query planning.
    /// Requires: same [`IndexType`], `other` at least as unique as `self`,
    /// and `self`'s parts an exact-prefix-length-matching prefix of
    /// `other`'s. `FullText`/`Spatial` are never redundant to one another
    /// unless their parts match exactly.
    #[must_use]
    pub fn redundant_to(&self, other: &Index) -> bool {
        if self.name == other.name {
            return false;
        }
        if self.index_type != other.index_type {
            return false;
        }
        if matches!(self.index_type, IndexType::FullText | IndexType::Spatial) {
            return self.parts == other.parts;
        }
        if self.uniqueness_rank() > other.uniqueness_rank() {
            return false;
        }
        if self.parts.len() > other.parts.len() {
            return false;
        }
        self.parts.iter().zip(other.parts.iter()).all(|(mine, theirs)| {
            mine.column == theirs.column && mine.prefix_length == theirs.prefix_length && mine.descending == theirs.descending
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferentialAction {
    Restrict,
    Cascade,
    SetNull,
    NoAction,
    SetDefault,
}

impl ReferentialAction {
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::NoAction => "NO ACTION",
            Self::SetDefault => "SET DEFAULT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub name: String,
    pub columns: Vec<String>,
    pub referenced_schema: String,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
    pub on_delete: ReferentialAction,
    pub on_update: ReferentialAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionMethod {
    Range,
    RangeColumns,
    List,
    ListColumns,
    Hash,
    LinearHash,
    Key,
    LinearKey,
}

impl PartitionMethod {
    #[must_use]
    pub fn is_hash_or_key(self) -> bool {
        matches!(self, Self::Hash | Self::LinearHash | Self::Key | Self::LinearKey)
    }

    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Range => "RANGE",
            Self::RangeColumns => "RANGE COLUMNS",
            Self::List => "LIST",
            Self::ListColumns => "LIST COLUMNS",
            Self::Hash => "HASH",
            Self::LinearHash => "LINEAR HASH",
            Self::Key => "KEY",
            Self::LinearKey => "LINEAR KEY",
        }
    }
}

/// How the generator should render a HASH/KEY partitioning's partition list:
/// RANGE/LIST partitioning always spells out each partition explicitly
/// (`Default`), but HASH/KEY can additionally collapse to a bare
/// `PARTITIONS n` clause or omit the clause entirely. Inferred from
/// `SHOW CREATE TABLE` text since `information_schema.partitions` doesn't
/// distinguish these directly; necessarily heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartitionRenderMode {
    #[default]
    Default,
    ExplicitList,
    CountClause,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionDef {
    pub name: String,
    pub sub_name: Option<String>,
    pub value: String,
    pub data_directory: Option<String>,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partitioning {
    pub method: PartitionMethod,
    pub sub_method: Option<PartitionMethod>,
    pub expression: String,
    pub sub_expression: Option<String>,
    pub partitions: Vec<PartitionDef>,
    pub render_mode: PartitionRenderMode,
    pub algorithm: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutineKind {
    Procedure,
    Function,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routine {
    pub name: String,
    pub kind: RoutineKind,
    pub definition: String,
    pub sql_mode: String,
    pub definer: String,
}

/// Validates the structural invariants the introspector and generator both
/// rely on: a table's declared engine must support the partitioning /
/// foreign-key / generated-column / index-expression features it claims to
/// use. Flavor-gated because the checks differ per vendor capability. On
/// failure, the returned message becomes `Table.unsupported_for_diff`.
#[must_use]
pub fn validate_table(table: &Table, flavor: Flavor) -> Option<String> {
    if table.partitioning.is_some() && !table.foreign_keys.is_empty() {
        return Some("partitioned tables cannot carry foreign keys".to_string());
    }
    if !flavor.supports_check_constraints() && table.comment.contains("CONSTRAINT") {
        return Some("check constraints are not supported by this flavor".to_string());
    }
    if !flavor.supports_generated_columns() && table.columns.iter().any(|c| c.generated.is_some()) {
        return Some("generated columns are not supported by this flavor".to_string());
    }
    let has_index_expression = table
        .primary_key
        .iter()
        .chain(table.secondary_indexes.iter())
        .flat_map(|index| &index.parts)
        .any(|part| part.expression.is_some());
    if !flavor.supports_index_expressions() && has_index_expression {
        return Some("functional index key parts are not supported by this flavor".to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flavor::Vendor;

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

    fn index(name: &str, index_type: IndexType, unique: bool, primary: bool, parts: Vec<IndexPart>) -> Index {
        Index {
            name: name.to_string(),
            index_type,
            unique,
            primary,
            parts,
            invisible: false,
            fulltext_parser: None,
            comment: String::new(),
        }
    }

    fn part(column: &str, prefix_length: Option<u32>) -> IndexPart {
        IndexPart { column: column.to_string(), prefix_length, descending: false, expression: None }
    }

    #[test]
    fn redundancy_matches_seed_scenario() {
        let pk = index("PRIMARY", IndexType::Btree, true, true, vec![part("a", None), part("b", None), part("c", None)]);
        let unique_abc = index("uq_abc", IndexType::Btree, true, false, vec![part("a", None), part("b", None), part("c", None)]);
        let key_abc = index("idx_abc", IndexType::Btree, false, false, vec![part("a", None), part("b", None), part("c", None)]);
        let key_ab_prefix = index("idx_ab_prefix", IndexType::Btree, false, false, vec![part("a", Some(5)), part("b", Some(10))]);

        assert!(key_abc.redundant_to(&pk));
        assert!(unique_abc.redundant_to(&pk));
        assert!(!pk.redundant_to(&unique_abc));
        assert!(!key_ab_prefix.redundant_to(&key_abc));
    }

    #[test]
    fn fulltext_never_redundant_unless_parts_match_exactly() {
        let a = index("ft_a", IndexType::FullText, false, false, vec![part("body", None)]);
        let b = index("ft_b", IndexType::FullText, false, false, vec![part("body", None)]);
        let c = index("ft_c", IndexType::FullText, false, false, vec![part("body", None), part("title", None)]);
        assert!(a.redundant_to(&b));
        assert!(!a.redundant_to(&c));
    }

    #[test]
    fn generated_columns_on_unsupporting_flavor_is_unsupported_for_diff() {
        let mut table = bare_table("t");
        table.columns.push(Column {
            name: "full_name".to_string(),
            column_type: "varchar(100)".to_string(),
            nullable: true,
            default: ColumnDefault::None,
            auto_increment: false,
            on_update_current_timestamp: false,
            charset: None,
            collation: None,
            comment: String::new(),
            generated: Some(GeneratedExpr { expression: "concat(a,b)".to_string(), stored: false }),
            compressed: false,
            invisible: false,
        });
        let ancient = Flavor::new(Vendor::MySql, 5, 5, 40);
        assert!(validate_table(&table, ancient).is_some());
        let modern = Flavor::new(Vendor::MySql, 8, 0, 34);
        assert!(validate_table(&table, modern).is_none());
    }
}
