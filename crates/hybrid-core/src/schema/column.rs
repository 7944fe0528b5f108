//! Columns and their kinds.

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SchemaError};
use crate::schema::table::Table;
use crate::types::ColumnType;

/// Back-reference from a satellite row to its parent document.
pub const SATELLITE_DOCUMENT_ID: &str = "DocumentId";
/// Position of the element within the projected collection.
pub const SATELLITE_ORDINAL: &str = "Ordinal";
/// The projected element itself.
pub const SATELLITE_VALUE: &str = "Value";

/// Who owns a column and how it is populated.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ColumnKind {
    /// Owned and written by the store itself (`Id`, `Etag`, timestamps).
    System,
    /// Store-defined payload column (`Document`, `Discriminator`, ...).
    #[default]
    Plain,
    /// Declared by a caller or a document mapping.
    User,
    /// Multi-valued projection flattened into its own satellite table.
    Collection {
        /// The satellite table, named `<Parent>_<Column>`.
        satellite: Table,
    },
}

/// A named, typed column.
///
/// Columns are plain values: they can be built standalone and handed to a
/// [`Table`] or a migration command. Primary key columns are never nullable,
/// however they were built or deserialized.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "ColumnDef")]
pub struct Column {
    name: String,
    column_type: ColumnType,
    nullable: bool,
    primary_key: bool,
    kind: ColumnKind,
}

/// Wire form of [`Column`] with every optional field defaulted.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ColumnDef {
    name: String,
    column_type: ColumnType,
    #[serde(default = "nullable_default")]
    nullable: bool,
    #[serde(default)]
    primary_key: bool,
    #[serde(default)]
    kind: ColumnKind,
}

const fn nullable_default() -> bool {
    true
}

impl From<ColumnDef> for Column {
    fn from(def: ColumnDef) -> Self {
        Self {
            name: def.name,
            column_type: def.column_type,
            nullable: def.nullable && !def.primary_key,
            primary_key: def.primary_key,
            kind: def.kind,
        }
    }
}

impl Column {
    /// A nullable store-defined column.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: true,
            primary_key: false,
            kind: ColumnKind::Plain,
        }
    }

    /// A non-null column owned by the store.
    pub fn system(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            nullable: false,
            kind: ColumnKind::System,
            ..Self::new(name, column_type)
        }
    }

    /// A nullable caller-declared column.
    pub fn user(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            kind: ColumnKind::User,
            ..Self::new(name, column_type)
        }
    }

    /// A caller-declared column without a type; resolves to an unbounded string.
    pub fn user_untyped(name: impl Into<String>) -> Self {
        Self::user(name, ColumnType::string())
    }

    /// Parse a `"Name type"` spec. A bare `"Name"` is an untyped user column.
    pub fn from_spec(spec: &str) -> Result<Self> {
        let spec = spec.trim();
        match spec.split_once(char::is_whitespace) {
            Some((name, ty)) => Ok(Self::user(name, ColumnType::parse(ty)?)),
            None if spec.is_empty() => Err(SchemaError::InvalidIdentifier(spec.to_owned())),
            None => Ok(Self::user_untyped(spec)),
        }
    }

    /// A collection projection of `element_type` values on table `parent`.
    ///
    /// The satellite table `<parent>_<name>` is created here, keyed by
    /// ([`SATELLITE_DOCUMENT_ID`], [`SATELLITE_ORDINAL`]).
    pub fn collection(parent: &str, name: impl Into<String>, element_type: ColumnType) -> Self {
        let name = name.into();
        let satellite = Table::from_parts(
            format!("{parent}_{name}"),
            vec![
                Self::system(SATELLITE_DOCUMENT_ID, ColumnType::UniqueId).primary_key(),
                Self::system(SATELLITE_ORDINAL, ColumnType::Int32).primary_key(),
                Self::new(SATELLITE_VALUE, element_type),
            ],
        );
        Self {
            kind: ColumnKind::Collection { satellite },
            ..Self::new(name, ColumnType::Int32)
        }
    }

    /// Mark as (part of) the primary key. Primary key columns are never null.
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    /// Disallow nulls.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Column name as declared.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Logical type.
    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    /// Whether nulls are allowed.
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Whether the column is part of the primary key.
    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    /// Ownership kind.
    pub fn kind(&self) -> &ColumnKind {
        &self.kind
    }

    /// Whether the store owns this column.
    pub fn is_system(&self) -> bool {
        matches!(self.kind, ColumnKind::System)
    }

    /// Satellite table of a collection column.
    pub fn satellite(&self) -> Option<&Table> {
        match &self.kind {
            ColumnKind::Collection { satellite } => Some(satellite),
            _ => None,
        }
    }

    /// Same column under a new name. Satellite tables keep their name.
    #[must_use]
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn spec_with_type() {
        let col = Column::from_spec("Id UniqueIdentifier").unwrap();
        assert_eq!(col.name(), "Id");
        assert_eq!(col.column_type(), ColumnType::UniqueId);
        assert!(col.is_nullable());
        assert_eq!(col.kind(), &ColumnKind::User);
    }

    #[test]
    fn spec_without_type_defaults_to_string() {
        let col = Column::from_spec("Name").unwrap();
        assert_eq!(col.column_type(), ColumnType::string());
    }

    #[test]
    fn spec_with_spaced_length() {
        let col = Column::from_spec("Body nvarchar( max )").unwrap();
        assert_eq!(col.column_type(), ColumnType::string());
    }

    #[test]
    fn empty_spec_rejected() {
        assert_matches!(Column::from_spec("  "), Err(SchemaError::InvalidIdentifier(_)));
    }

    #[test]
    fn primary_key_implies_not_null() {
        let col = Column::new("Id", ColumnType::UniqueId).primary_key();
        assert!(col.is_primary_key());
        assert!(!col.is_nullable());
    }

    #[test]
    fn deserialized_primary_key_is_not_null() {
        let col: Column = serde_json::from_value(serde_json::json!({
            "name": "Id",
            "columnType": {"kind": "uniqueId"},
            "primaryKey": true
        }))
        .unwrap();
        assert!(col.is_primary_key());
        assert!(!col.is_nullable());

        let col: Column = serde_json::from_value(serde_json::json!({
            "name": "Note",
            "columnType": {"kind": "string"}
        }))
        .unwrap();
        assert!(col.is_nullable());
        assert_eq!(col.kind(), &ColumnKind::Plain);
    }

    #[test]
    fn collection_owns_satellite() {
        let col = Column::collection("Entities", "Tags", ColumnType::string());
        let satellite = col.satellite().unwrap();
        assert_eq!(satellite.name(), "Entities_Tags");

        let names: Vec<_> = satellite.columns().iter().map(Column::name).collect();
        assert_eq!(names, ["DocumentId", "Ordinal", "Value"]);

        let pk: Vec<_> = satellite.primary_key().map(Column::name).collect();
        assert_eq!(pk, ["DocumentId", "Ordinal"]);
    }

    #[test]
    fn renaming_keeps_satellite_name() {
        let col = Column::collection("Entities", "Tags", ColumnType::string());
        let renamed = col.renamed("Labels");
        assert_eq!(renamed.name(), "Labels");
        assert_eq!(renamed.satellite().unwrap().name(), "Entities_Tags");
    }
}
