//! Schema error types.
//!
//! [`SchemaError`] covers every failure that can be detected from the
//! in-memory schema model or reported by a catalog pre-check, before any DDL
//! reaches the backend.

use thiserror::Error;

/// Errors raised while composing or validating schema changes.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// A table with this name already exists.
    #[error("table already exists: {0}")]
    DuplicateTable(String),

    /// A column with this name already exists in the table.
    #[error("column already exists: {table}.{column}")]
    DuplicateColumn {
        /// Owning table.
        table: String,
        /// Conflicting column name.
        column: String,
    },

    /// The table does not exist.
    #[error("table not found: {0}")]
    TableNotFound(String),

    /// The column does not exist in the table.
    #[error("column not found: {table}.{column}")]
    ColumnNotFound {
        /// Owning table.
        table: String,
        /// Missing column name.
        column: String,
    },

    /// A column type spec that cannot be mapped to a logical type.
    #[error("unsupported column type: {0}")]
    UnsupportedType(String),

    /// A schema operation the model or dialect cannot express.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// An identifier that cannot be quoted for the backend.
    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    /// A table declared without any columns.
    #[error("table declares no columns: {0}")]
    EmptyTable(String),
}

impl SchemaError {
    /// Whether this error reports a name collision with an existing object.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateTable(_) | Self::DuplicateColumn { .. })
    }

    /// Whether this error reports a missing table or column.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::TableNotFound(_) | Self::ColumnNotFound { .. })
    }

    pub(crate) fn duplicate_column(table: &str, column: &str) -> Self {
        Self::DuplicateColumn {
            table: table.to_owned(),
            column: column.to_owned(),
        }
    }

    pub(crate) fn column_not_found(table: &str, column: &str) -> Self {
        Self::ColumnNotFound {
            table: table.to_owned(),
            column: column.to_owned(),
        }
    }
}

/// Result type for schema operations.
pub type Result<T> = std::result::Result<T, SchemaError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
