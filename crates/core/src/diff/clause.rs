//! The alter-clause tagged union: the unit of change a table diff produces.
//! Every clause knows whether it is unsafe on its own, which the formatter
//! uses to gate destructive DDL behind `StatementModifiers::allow_unsafe`.

use crate::schema::{ForeignKey, Index, PartitionDef, Partitioning};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlterClause {
    AddColumn {
        name: String,
        definition: String,
        after: Option<String>,
    },
    DropColumn {
        name: String,
    },
    ModifyColumn {
        name: String,
        definition: String,
        after: Option<String>,
        is_unsafe: bool,
        /// True when the column's own definition is unchanged and only its
        /// declared position moved — lets `StatementModifiers::lax_column_order`
        /// suppress purely cosmetic reorderings.
        positional_only: bool,
    },
    AddIndex {
        index: Index,
    },
    DropIndex {
        name: String,
    },
    AddPrimaryKey {
        index: Index,
    },
    DropPrimaryKey,
    AddForeignKey {
        foreign_key: ForeignKey,
    },
    DropForeignKey {
        name: String,
    },
    ChangeEngine {
        to: String,
    },
    ChangeAutoIncrement {
        to: u64,
    },
    ChangeComment {
        to: String,
    },
    ChangeCharsetCollation {
        charset: String,
        collation: String,
    },
    ChangeRowFormat {
        to: String,
    },
    RemovePartitioning,
    AddPartitioning {
        partitioning: Partitioning,
    },
    ModifyPartitioning {
        partitioning: Partitioning,
    },
    AddPartitionList {
        partitions: Vec<PartitionDef>,
    },
    DropPartitionList {
        names: Vec<String>,
    },
}

impl AlterClause {
    /// True if applying this clause alone can lose data: dropping a column,
    /// dropping the primary key, a column-type change flagged unsafe by
    /// [`crate::types::modify_column_type_is_unsafe`], or dropping
    /// partitions outright.
    #[must_use]
    pub fn is_unsafe(&self) -> bool {
        match self {
            Self::DropColumn { .. } | Self::DropPrimaryKey | Self::DropPartitionList { .. } => true,
            Self::ModifyColumn { is_unsafe, .. } => *is_unsafe,
            _ => false,
        }
    }

    /// A short label for logging/display, independent of the rendered SQL.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::AddColumn { name, .. } => format!("ADD COLUMN `{name}`"),
            Self::DropColumn { name } => format!("DROP COLUMN `{name}`"),
            Self::ModifyColumn { name, .. } => format!("MODIFY COLUMN `{name}`"),
            Self::AddIndex { index } => format!("ADD INDEX `{}`", index.name),
            Self::DropIndex { name } => format!("DROP INDEX `{name}`"),
            Self::AddPrimaryKey { .. } => "ADD PRIMARY KEY".to_string(),
            Self::DropPrimaryKey => "DROP PRIMARY KEY".to_string(),
            Self::AddForeignKey { foreign_key } => format!("ADD FOREIGN KEY `{}`", foreign_key.name),
            Self::DropForeignKey { name } => format!("DROP FOREIGN KEY `{name}`"),
            Self::ChangeEngine { to } => format!("ENGINE={to}"),
            Self::ChangeAutoIncrement { to } => format!("AUTO_INCREMENT={to}"),
            Self::ChangeComment { .. } => "COMMENT=...".to_string(),
            Self::ChangeCharsetCollation { charset, .. } => format!("CHARSET={charset}"),
            Self::ChangeRowFormat { to } => format!("ROW_FORMAT={to}"),
            Self::RemovePartitioning => "REMOVE PARTITIONING".to_string(),
            Self::AddPartitioning { .. } => "ADD PARTITIONING".to_string(),
            Self::ModifyPartitioning { .. } => "MODIFY PARTITIONING".to_string(),
            Self::AddPartitionList { partitions } => {
                format!("ADD PARTITION ({})", partitions.iter().map(|p| p.name.as_str()).collect::<Vec<_>>().join(","))
            }
            Self::DropPartitionList { names } => format!("DROP PARTITION {}", names.join(",")),
        }
    }
}
