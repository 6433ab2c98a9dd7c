//! Structural lint pass: findings that aren't errors by themselves but are
//! worth surfacing alongside a diff — missing primary keys, redundant
//! secondary indexes, and foreign keys pointing at a table that doesn't
//! exist in the same schema.

use std::collections::BTreeMap;

use crate::schema::Schema;

/// Whether a [`LintFinding`] should fail a CI gate or just be reported.
/// Each finding kind has a conservative built-in default (see
/// [`LintFinding::default_severity`]); a caller overrides individual kinds
/// through `DiffConfig::lint_severity_overrides`, keyed by
/// [`LintFinding::kind_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LintSeverity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LintFinding {
    MissingPrimaryKey {
        table: String,
    },
    RedundantIndex {
        table: String,
        index: String,
        redundant_to: String,
    },
    NoSuchReferencedTable {
        table: String,
        foreign_key: String,
        referenced_table: String,
    },
}

impl LintFinding {
    #[must_use]
    pub fn table(&self) -> &str {
        match self {
            Self::MissingPrimaryKey { table }
            | Self::RedundantIndex { table, .. }
            | Self::NoSuchReferencedTable { table, .. } => table,
        }
    }

    /// Stable key used to look a finding up in a severity-override map —
    /// independent of the instance's table/index names.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::MissingPrimaryKey { .. } => "missing_primary_key",
            Self::RedundantIndex { .. } => "redundant_index",
            Self::NoSuchReferencedTable { .. } => "no_such_referenced_table",
        }
    }

    /// Severity a caller gets unless `overrides` names this finding's
    /// [`Self::kind_name`] explicitly. A dangling foreign key is an error by
    /// default since it can't be applied against a real server; the other
    /// two are advisory.
    #[must_use]
    pub fn default_severity(&self) -> LintSeverity {
        match self {
            Self::MissingPrimaryKey { .. } | Self::RedundantIndex { .. } => LintSeverity::Warning,
            Self::NoSuchReferencedTable { .. } => LintSeverity::Error,
        }
    }

    #[must_use]
    pub fn severity(&self, overrides: &BTreeMap<String, LintSeverity>) -> LintSeverity {
        overrides.get(self.kind_name()).copied().unwrap_or_else(|| self.default_severity())
    }
}

#[must_use]
pub fn lint_schema(schema: &Schema) -> Vec<LintFinding> {
    let mut findings = Vec::new();

    for table in &schema.tables {
        if table.primary_key.is_none() {
            findings.push(LintFinding::MissingPrimaryKey { table: table.name.clone() });
        }

        for index in &table.secondary_indexes {
            for other in &table.secondary_indexes {
                if index.redundant_to(other) {
                    findings.push(LintFinding::RedundantIndex {
                        table: table.name.clone(),
                        index: index.name.clone(),
                        redundant_to: other.name.clone(),
                    });
                }
            }
            if let Some(pk) = &table.primary_key {
                if index.redundant_to(pk) {
                    findings.push(LintFinding::RedundantIndex {
                        table: table.name.clone(),
                        index: index.name.clone(),
                        redundant_to: pk.name.clone(),
                    });
                }
            }
        }

        for fk in &table.foreign_keys {
            let same_schema = fk.referenced_schema == schema.name || fk.referenced_schema.is_empty();
            if same_schema && schema.table(&fk.referenced_table).is_none() {
                findings.push(LintFinding::NoSuchReferencedTable {
                    table: table.name.clone(),
                    foreign_key: fk.name.clone(),
                    referenced_table: fk.referenced_table.clone(),
                });
            }
        }
    }

    findings
}
