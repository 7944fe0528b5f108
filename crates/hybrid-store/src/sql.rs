//! Type and identifier translation for `SQLite`.
//!
//! Declared types are chosen so the catalog reports the logical type back:
//! every name below parses with [`ColumnType::parse`] to the type it came
//! from, and `SQLite` assigns each a sensible storage affinity.

use hybrid_core::{BackendMode, ColumnType, Result, validate_identifier};

/// Declared `SQLite` type for a logical column type.
pub fn sql_type(ty: ColumnType) -> String {
    match ty {
        ColumnType::UniqueId => "UNIQUEIDENTIFIER".into(),
        ColumnType::Binary { max_len: None } => "BLOB".into(),
        ColumnType::Binary { max_len: Some(n) } => format!("VARBINARY({n})"),
        ColumnType::FixedString { len } => format!("NCHAR({len})"),
        ColumnType::String { max_len: None } => "TEXT".into(),
        ColumnType::String { max_len: Some(n) } => format!("NVARCHAR({n})"),
        ColumnType::Int32 => "INT".into(),
        ColumnType::Int64 => "BIGINT".into(),
        ColumnType::Boolean => "BOOLEAN".into(),
        ColumnType::Double => "REAL".into(),
        ColumnType::Timestamp => "DATETIME".into(),
        ColumnType::TimestampOffset => "DATETIMEOFFSET".into(),
    }
}

/// Quote an identifier unconditionally, doubling embedded quotes.
pub fn quote_identifier(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// Schema holding the tables of a backend mode.
pub const fn schema_name(mode: BackendMode) -> &'static str {
    match mode {
        BackendMode::Durable => "main",
        BackendMode::Ephemeral => "temp",
    }
}

/// Schema-qualified, quoted table name.
pub fn qualified(mode: BackendMode, table: &str) -> Result<String> {
    Ok(format!("{}.{}", schema_name(mode), quote_identifier(table)?))
}
