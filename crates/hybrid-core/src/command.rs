//! Migration commands.
//!
//! A [`MigrationCommand`] describes exactly one schema change. Commands are
//! immutable values; executing them is the store's job.

use serde::{Deserialize, Serialize};

use crate::schema::{Column, Table};

/// One schema change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum MigrationCommand {
    /// Create a table with all of its stored columns.
    AddTable {
        /// Table to create.
        table: Table,
    },
    /// Drop a table.
    RemoveTable {
        /// Table name.
        table: String,
    },
    /// Rename a table, keeping its columns.
    RenameTable {
        /// Current name.
        from: String,
        /// New name.
        to: String,
    },
    /// Add a column to an existing table.
    AddColumn {
        /// Table name.
        table: String,
        /// Column to add.
        column: Column,
    },
    /// Drop a column.
    RemoveColumn {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
    },
    /// Rename a column.
    RenameColumn {
        /// Table name.
        table: String,
        /// Current column name.
        from: String,
        /// New column name.
        to: String,
    },
}

impl MigrationCommand {
    /// Name of the table the command operates on (its current name).
    pub fn table_name(&self) -> &str {
        match self {
            Self::AddTable { table } => table.name(),
            Self::RemoveTable { table }
            | Self::AddColumn { table, .. }
            | Self::RemoveColumn { table, .. }
            | Self::RenameColumn { table, .. } => table,
            Self::RenameTable { from, .. } => from,
        }
    }

    /// Short operation name for logs.
    pub fn op(&self) -> &'static str {
        match self {
            Self::AddTable { .. } => "add_table",
            Self::RemoveTable { .. } => "remove_table",
            Self::RenameTable { .. } => "rename_table",
            Self::AddColumn { .. } => "add_column",
            Self::RemoveColumn { .. } => "remove_column",
            Self::RenameColumn { .. } => "rename_column",
        }
    }
}

impl std::fmt::Display for MigrationCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AddTable { table } => {
                write!(f, "add table {} ({} columns)", table.name(), table.len())
            }
            Self::RemoveTable { table } => write!(f, "remove table {table}"),
            Self::RenameTable { from, to } => write!(f, "rename table {from} to {to}"),
            Self::AddColumn { table, column } => write!(
                f,
                "add column {table}.{} {}",
                column.name(),
                column.column_type()
            ),
            Self::RemoveColumn { table, column } => write!(f, "remove column {table}.{column}"),
            Self::RenameColumn { table, from, to } => {
                write!(f, "rename column {table}.{from} to {to}")
            }
        }
    }
}
