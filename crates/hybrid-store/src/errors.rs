//! Error types for the store.
//!
//! [`StoreError`] wraps schema errors raised before any DDL runs, and adds
//! the failures that only a live backend can report.

use hybrid_core::SchemaError;
use thiserror::Error;

/// Errors returned by store and migration operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Invalid schema change, caught in memory or by a catalog pre-check.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The backend rejected a DDL statement.
    #[error("schema migration failed at `{statement}`: {source}")]
    MigrationFailed {
        /// The statement that failed.
        statement: String,
        /// Backend error.
        #[source]
        source: rusqlite::Error,
    },

    /// A post-migration check rejected the batch.
    #[error("migration rejected: {0}")]
    Rejected(String),

    /// `SQLite` error outside DDL execution.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Filesystem error while preparing a database file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Whether this error reports a name collision with an existing object.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Schema(e) if e.is_duplicate())
    }

    /// Whether this error reports a missing table or column.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Schema(e) if e.is_not_found())
    }

    /// The schema error, if this is one.
    pub fn as_schema(&self) -> Option<&SchemaError> {
        match self {
            Self::Schema(e) => Some(e),
            _ => None,
        }
    }
}

/// Convenience type alias for store results.
pub type Result<T> = std::result::Result<T, StoreError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_error_is_transparent() {
        let err = StoreError::from(SchemaError::TableNotFound("Entities".into()));
        assert_eq!(err.to_string(), "table not found: Entities");
        assert!(err.is_not_found());
        assert!(!err.is_duplicate());
    }

    #[test]
    fn migration_failed_names_statement() {
        let err = StoreError::MigrationFailed {
            statement: "DROP TABLE main.\"Entities\"".into(),
            source: rusqlite::Error::QueryReturnedNoRows,
        };
        let text = err.to_string();
        assert!(text.contains("DROP TABLE main.\"Entities\""));
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.as_schema().is_none());
    }

    #[test]
    fn sqlite_error_display() {
        let err = StoreError::Sqlite(rusqlite::Error::QueryReturnedNoRows);
        assert!(err.to_string().contains("sqlite error"));
    }
}
