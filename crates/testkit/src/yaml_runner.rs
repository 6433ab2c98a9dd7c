use std::collections::BTreeMap;

use schemasync_core::{Column, ColumnDefault, Flavor, Index, IndexPart, IndexType, Table};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ColumnFixture {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
    pub nullable: bool,
    pub default: Option<String>,
    pub auto_increment: bool,
    pub comment: String,
}

impl ColumnFixture {
    fn into_column(self) -> Column {
        Column {
            name: self.name,
            column_type: self.column_type,
            nullable: self.nullable,
            default: match self.default {
                Some(literal) => ColumnDefault::Literal(literal),
                None if self.nullable => ColumnDefault::Null,
                None => ColumnDefault::None,
            },
            auto_increment: self.auto_increment,
            on_update_current_timestamp: false,
            charset: None,
            collation: None,
            comment: self.comment,
            generated: None,
            compressed: false,
            invisible: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TableFixture {
    pub name: String,
    pub engine: String,
    pub charset: String,
    pub collation: String,
    pub columns: Vec<ColumnFixture>,
    pub primary_key: Vec<String>,
}

impl TableFixture {
    pub fn into_table(self) -> Table {
        let primary_key = if self.primary_key.is_empty() {
            None
        } else {
            Some(Index {
                name: "PRIMARY".to_string(),
                index_type: IndexType::Btree,
                unique: true,
                primary: true,
                parts: self
                    .primary_key
                    .iter()
                    .map(|column| IndexPart {
                        column: column.clone(),
                        prefix_length: None,
                        descending: false,
                        expression: None,
                    })
                    .collect(),
                invisible: false,
                fulltext_parser: None,
                comment: String::new(),
            })
        };

        Table {
            name: self.name,
            engine: if self.engine.is_empty() { "InnoDB".to_string() } else { self.engine },
            row_format: None,
            charset: if self.charset.is_empty() { "utf8mb4".to_string() } else { self.charset },
            collation: self.collation,
            comment: String::new(),
            create_options: String::new(),
            auto_increment: None,
            columns: self.columns.into_iter().map(ColumnFixture::into_column).collect(),
            primary_key,
            secondary_indexes: vec![],
            foreign_keys: vec![],
            partitioning: None,
            unsupported_for_diff: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TestCase {
    pub old: TableFixture,
    pub new: TableFixture,
    pub flavor: Option<String>,
    pub expect_unsafe: bool,
    pub expect_clauses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestResult {
    Passed,
    Skipped(String),
    Failed(String),
}

pub fn load_test_cases_from_str(yaml: &str) -> Result<BTreeMap<String, TestCase>, serde_yaml::Error> {
    serde_yaml::from_str(yaml)
}

/// `requirement` of `None` always matches; `!flavor` excludes that flavor
/// specifically; anything else must match `current_flavor` exactly (e.g.
/// `mysql-8.0` matching a flavor display prefix).
#[must_use]
pub fn matches_flavor(requirement: Option<&str>, current_flavor: &str) -> bool {
    let Some(requirement) = requirement.map(str::trim).filter(|value| !value.is_empty()) else {
        return true;
    };

    if let Some(excluded) = requirement.strip_prefix('!') {
        return !current_flavor.starts_with(excluded);
    }

    current_flavor.starts_with(requirement)
}

fn clause_labels(clauses: &[schemasync_core::AlterClause]) -> Vec<String> {
    clauses.iter().map(schemasync_core::AlterClause::label).collect()
}

/// Runs one fixture's old->new diff and checks it against the fixture's
/// expectations. `current_flavor` gates on [`TestCase::flavor`] the same
/// way a live online run would skip a fixture that doesn't apply to the
/// server it's pointed at.
#[must_use]
pub fn run_diff_test(test: &TestCase, flavor: Flavor) -> TestResult {
    let display = flavor.to_string();
    if !matches_flavor(test.flavor.as_deref(), &display) {
        return TestResult::Skipped(format!(
            "fixture requires flavor '{}', running on '{display}'",
            test.flavor.as_deref().unwrap_or_default()
        ));
    }

    let old_table = test.old.clone().into_table();
    let new_table = test.new.clone().into_table();
    let old_schema = schemasync_core::Schema {
        name: "fixture".to_string(),
        default_charset: "utf8mb4".to_string(),
        default_collation: "utf8mb4_0900_ai_ci".to_string(),
        tables: vec![old_table],
        routines: vec![],
    };
    let new_schema = schemasync_core::Schema {
        name: "fixture".to_string(),
        default_charset: "utf8mb4".to_string(),
        default_collation: "utf8mb4_0900_ai_ci".to_string(),
        tables: vec![new_table],
        routines: vec![],
    };

    let diff = schemasync_core::diff_schemas(&old_schema, &new_schema, flavor);
    let Some(schemasync_core::ObjectDiff::AlterTable { clauses, .. }) = diff.object_diffs.first() else {
        return if test.expect_clauses.is_empty() {
            TestResult::Passed
        } else {
            TestResult::Failed(format!("expected clauses {:?}, got no AlterTable diff", test.expect_clauses))
        };
    };

    let actual_labels = clause_labels(clauses);
    if actual_labels != test.expect_clauses {
        return TestResult::Failed(format!(
            "expected clauses {:?}, got {actual_labels:?}",
            test.expect_clauses
        ));
    }
    let actual_unsafe = clauses.iter().any(schemasync_core::AlterClause::is_unsafe);
    if actual_unsafe != test.expect_unsafe {
        return TestResult::Failed(format!("expected unsafe={}, got {actual_unsafe}", test.expect_unsafe));
    }

    TestResult::Passed
}
