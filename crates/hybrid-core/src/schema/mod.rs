//! In-memory schema model: columns, tables and the canonical document table.
//!
//! Pure data plus invariant checks. Nothing in this module touches a
//! connection, so schemas can be composed and validated before any DDL exists.

pub mod column;
pub mod document_table;
pub mod table;

pub use column::{Column, ColumnKind, SATELLITE_DOCUMENT_ID, SATELLITE_ORDINAL, SATELLITE_VALUE};
pub use document_table::{BUILT_IN_COLUMNS, DocumentTable};
pub use table::Table;

use crate::errors::{Result, SchemaError};

/// Check that a table or column name can be quoted for the backend.
///
/// Any character is allowed except NUL; blank names are rejected.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.trim().is_empty() || name.contains('\0') {
        return Err(SchemaError::InvalidIdentifier(name.to_owned()));
    }
    Ok(())
}
