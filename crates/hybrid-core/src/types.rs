//! Logical column types.
//!
//! [`ColumnType`] is a closed set of storage types attached to every column at
//! construction. Backends map it to their own type names; nothing here knows
//! about a particular dialect.
//!
//! [`ColumnType::parse`] accepts the loose textual vocabulary callers use in
//! `"Name type"` column specs (`"Id UniqueIdentifier"`, `"Property int"`,
//! `"Discriminator nchar(255)"`).

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SchemaError};

/// Logical storage type of a column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ColumnType {
    /// 128-bit globally unique identifier.
    UniqueId,
    /// Variable-length binary. `None` is unbounded.
    #[serde(rename_all = "camelCase")]
    Binary {
        /// Maximum length in bytes.
        max_len: Option<u32>,
    },
    /// Fixed-length string.
    FixedString {
        /// Length in characters.
        len: u32,
    },
    /// Variable-length string. `None` is unbounded.
    #[serde(rename_all = "camelCase")]
    String {
        /// Maximum length in characters.
        max_len: Option<u32>,
    },
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// Boolean flag.
    Boolean,
    /// Double-precision float.
    Double,
    /// Timestamp without offset.
    Timestamp,
    /// Timestamp carrying a UTC offset.
    TimestampOffset,
}

impl ColumnType {
    /// Unbounded binary payload.
    pub const fn binary() -> Self {
        Self::Binary { max_len: None }
    }

    /// Unbounded string. Used whenever a column is declared without a type.
    pub const fn string() -> Self {
        Self::String { max_len: None }
    }

    /// Fixed-length string of `len` characters.
    pub const fn fixed_string(len: u32) -> Self {
        Self::FixedString { len }
    }

    /// Parse a textual type spec such as `int`, `nvarchar(255)` or
    /// `varbinary(max)`. Matching is ASCII case-insensitive.
    pub fn parse(spec: &str) -> Result<Self> {
        let spec = spec.trim();
        let unsupported = || SchemaError::UnsupportedType(spec.to_owned());

        let (name, length) = match spec.split_once('(') {
            Some((name, rest)) => {
                let inner = rest.strip_suffix(')').ok_or_else(unsupported)?;
                (name.trim(), Some(parse_length(inner).ok_or_else(unsupported)?))
            }
            None => (spec, None),
        };

        let ty = match (name.to_ascii_lowercase().as_str(), length) {
            ("uniqueidentifier" | "uuid" | "guid", None) => Self::UniqueId,
            ("int" | "integer" | "int32", None) => Self::Int32,
            ("bigint" | "int64", None) => Self::Int64,
            ("bit" | "bool" | "boolean", None) => Self::Boolean,
            ("float" | "double" | "real", None) => Self::Double,
            ("datetime" | "datetime2" | "timestamp", None) => Self::Timestamp,
            ("datetimeoffset" | "timestamptz", None) => Self::TimestampOffset,
            ("varbinary" | "blob" | "binary", length) => Self::Binary {
                max_len: length.flatten(),
            },
            ("nvarchar" | "varchar", length) => Self::String {
                max_len: length.flatten(),
            },
            ("text" | "string", None) => Self::string(),
            ("nchar" | "char", None) => Self::fixed_string(1),
            ("nchar" | "char", Some(Some(len))) => Self::fixed_string(len),
            _ => return Err(unsupported()),
        };
        Ok(ty)
    }
}

/// `Some(None)` for `max`, `Some(Some(n))` for a positive length.
fn parse_length(raw: &str) -> Option<Option<u32>> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("max") {
        return Some(None);
    }
    match raw.parse::<u32>() {
        Ok(0) | Err(_) => None,
        Ok(n) => Some(Some(n)),
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UniqueId => write!(f, "unique id"),
            Self::Binary { max_len: None } => write!(f, "binary"),
            Self::Binary { max_len: Some(n) } => write!(f, "binary({n})"),
            Self::FixedString { len } => write!(f, "fixed string({len})"),
            Self::String { max_len: None } => write!(f, "string"),
            Self::String { max_len: Some(n) } => write!(f, "string({n})"),
            Self::Int32 => write!(f, "int32"),
            Self::Int64 => write!(f, "int64"),
            Self::Boolean => write!(f, "boolean"),
            Self::Double => write!(f, "double"),
            Self::Timestamp => write!(f, "timestamp"),
            Self::TimestampOffset => write!(f, "timestamp with offset"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
