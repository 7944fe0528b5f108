//! The canonical document table.
//!
//! Every document table starts with the same eight columns, in this order:
//!
//! | Column | Type | Notes |
//! |---|---|---|
//! | `Id` | unique id | primary key |
//! | `Etag` | unique id | changes on every write |
//! | `CreatedAt` | timestamp with offset | |
//! | `ModifiedAt` | timestamp with offset | |
//! | `Document` | unbounded binary | serialized payload |
//! | `Discriminator` | fixed string (255) | concrete document type |
//! | `State` | fixed string (255) | free-form status marker |
//! | `Version` | int32 | document version tag |
//!
//! User projections and collection columns follow them.

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SchemaError};
use crate::schema::column::Column;
use crate::schema::table::{Table, fold};
use crate::types::ColumnType;

/// Primary key column.
pub const ID: &str = "Id";
/// Optimistic concurrency token.
pub const ETAG: &str = "Etag";
/// Creation timestamp.
pub const CREATED_AT: &str = "CreatedAt";
/// Last modification timestamp.
pub const MODIFIED_AT: &str = "ModifiedAt";
/// Serialized document payload.
pub const DOCUMENT: &str = "Document";
/// Concrete document type name.
pub const DISCRIMINATOR: &str = "Discriminator";
/// Free-form status marker.
pub const STATE: &str = "State";
/// Document version tag.
pub const VERSION: &str = "Version";

/// Built-in column names in table order.
pub const BUILT_IN_COLUMNS: [&str; 8] = [
    ID,
    ETAG,
    CREATED_AT,
    MODIFIED_AT,
    DOCUMENT,
    DISCRIMINATOR,
    STATE,
    VERSION,
];

const MARKER_LEN: u32 = 255;

/// A [`Table`] pre-populated with the document store's built-in columns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Table", into = "Table")]
pub struct DocumentTable {
    table: Table,
}

impl DocumentTable {
    /// A document table with only the built-in columns.
    pub fn new(name: impl Into<String>) -> Self {
        let table = Table::from_parts(
            name.into(),
            vec![
                Column::system(ID, ColumnType::UniqueId).primary_key(),
                Column::system(ETAG, ColumnType::UniqueId),
                Column::system(CREATED_AT, ColumnType::TimestampOffset),
                Column::system(MODIFIED_AT, ColumnType::TimestampOffset),
                Column::new(DOCUMENT, ColumnType::binary()),
                Column::new(DISCRIMINATOR, ColumnType::fixed_string(MARKER_LEN)),
                Column::new(STATE, ColumnType::fixed_string(MARKER_LEN)),
                Column::new(VERSION, ColumnType::Int32),
            ],
        );
        Self { table }
    }

    /// Whether `name` is one of the built-in columns.
    pub fn is_built_in(name: &str) -> bool {
        BUILT_IN_COLUMNS.iter().any(|c| fold(c) == fold(name))
    }

    /// Table name.
    pub fn name(&self) -> &str {
        self.table.name()
    }

    /// The underlying table.
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Consume into the underlying table.
    pub fn into_table(self) -> Table {
        self.table
    }

    /// Add a user projection column.
    pub fn register(&mut self, column: Column) -> Result<()> {
        if let Some(satellite) = column.satellite() {
            let expected = format!("{}_{}", self.name(), column.name());
            if satellite.name() != expected {
                return Err(SchemaError::UnsupportedOperation(format!(
                    "collection column {} belongs to {}, not {}",
                    column.name(),
                    satellite.name(),
                    expected
                )));
            }
        }
        self.table.register(column)
    }

    /// Add a collection projection of `element_type` values, creating its
    /// satellite table.
    pub fn add_collection(
        &mut self,
        name: impl Into<String>,
        element_type: ColumnType,
    ) -> Result<&Column> {
        let column = Column::collection(self.table.name(), name, element_type);
        let key = column.name().to_owned();
        self.table.register(column)?;
        self.table
            .column(&key)
            .ok_or_else(|| SchemaError::column_not_found(self.table.name(), &key))
    }

    /// Remove a user column. Built-in columns cannot be removed.
    pub fn remove(&mut self, name: &str) -> Result<Column> {
        self.guard_built_in(name, "removed")?;
        self.table.remove(name)
    }

    /// Rename a user column. Built-in columns cannot be renamed.
    pub fn rename_column(&mut self, from: &str, to: &str) -> Result<()> {
        self.guard_built_in(from, "renamed")?;
        if Self::is_built_in(to) {
            return Err(SchemaError::duplicate_column(self.name(), to));
        }
        self.table.rename_column(from, to)
    }

    /// Columns following the built-ins.
    pub fn user_columns(&self) -> &[Column] {
        &self.table.columns()[BUILT_IN_COLUMNS.len()..]
    }

    /// `Id` column.
    pub fn id_column(&self) -> &Column {
        self.built_in(0)
    }

    /// `Etag` column.
    pub fn etag_column(&self) -> &Column {
        self.built_in(1)
    }

    /// `CreatedAt` column.
    pub fn created_at_column(&self) -> &Column {
        self.built_in(2)
    }

    /// `ModifiedAt` column.
    pub fn modified_at_column(&self) -> &Column {
        self.built_in(3)
    }

    /// `Document` column.
    pub fn document_column(&self) -> &Column {
        self.built_in(4)
    }

    /// `Discriminator` column.
    pub fn discriminator_column(&self) -> &Column {
        self.built_in(5)
    }

    /// `State` column.
    pub fn state_column(&self) -> &Column {
        self.built_in(6)
    }

    /// `Version` column.
    pub fn version_column(&self) -> &Column {
        self.built_in(7)
    }

    // Built-ins occupy the first slots and can never be removed.
    fn built_in(&self, slot: usize) -> &Column {
        &self.table.columns()[slot]
    }

    fn guard_built_in(&self, name: &str, action: &str) -> Result<()> {
        if Self::is_built_in(name) {
            return Err(SchemaError::UnsupportedOperation(format!(
                "built-in column {}.{name} cannot be {action}",
                self.name()
            )));
        }
        Ok(())
    }
}

impl AsRef<Table> for DocumentTable {
    fn as_ref(&self) -> &Table {
        &self.table
    }
}

impl From<DocumentTable> for Table {
    fn from(doc: DocumentTable) -> Self {
        doc.table
    }
}

impl TryFrom<Table> for DocumentTable {
    type Error = SchemaError;

    /// Accepts tables whose leading columns match the built-ins.
    fn try_from(table: Table) -> Result<Self> {
        let mut doc = Self::new(table.name());
        let columns = table.columns();
        for (expected, actual) in doc.table.columns().iter().zip(columns) {
            if expected != actual {
                return Err(SchemaError::UnsupportedOperation(format!(
                    "{} is not a document table: expected built-in column {} at position of {}",
                    table.name(),
                    expected.name(),
                    actual.name()
                )));
            }
        }
        if columns.len() < BUILT_IN_COLUMNS.len() {
            return Err(SchemaError::UnsupportedOperation(format!(
                "{} is not a document table: missing built-in columns",
                table.name()
            )));
        }
        for column in &columns[BUILT_IN_COLUMNS.len()..] {
            doc.register(column.clone())?;
        }
        Ok(doc)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
