//! Tables: ordered column registries with case-insensitive lookup.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SchemaError};
use crate::schema::column::Column;

/// Case-folded lookup key. Backend identifiers compare ASCII case-insensitively.
pub(crate) fn fold(name: &str) -> String {
    name.to_ascii_lowercase()
}

/// A named table with columns in registration order.
///
/// Registration order is the column order of generated DDL. Names are unique
/// under ASCII case-insensitive comparison.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(into = "TableDef", try_from = "TableDef")]
pub struct Table {
    name: String,
    columns: Vec<Column>,
    index: HashMap<String, usize>,
}

#[derive(Serialize, Deserialize)]
struct TableDef {
    name: String,
    #[serde(default)]
    columns: Vec<Column>,
}

impl From<Table> for TableDef {
    fn from(table: Table) -> Self {
        Self {
            name: table.name,
            columns: table.columns,
        }
    }
}

impl TryFrom<TableDef> for Table {
    type Error = SchemaError;

    fn try_from(def: TableDef) -> Result<Self> {
        Self::with_columns(def.name, def.columns)
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.columns == other.columns
    }
}

impl Eq for Table {}

impl Table {
    /// An empty table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// A table with the given columns, registered in order.
    pub fn with_columns(
        name: impl Into<String>,
        columns: impl IntoIterator<Item = Column>,
    ) -> Result<Self> {
        let mut table = Self::new(name);
        for column in columns {
            table.register(column)?;
        }
        Ok(table)
    }

    /// Build from columns already known to be distinct.
    pub(crate) fn from_parts(name: String, columns: Vec<Column>) -> Self {
        let mut table = Self {
            name,
            columns,
            index: HashMap::new(),
        };
        table.reindex();
        debug_assert_eq!(table.index.len(), table.columns.len());
        table
    }

    /// Table name as declared.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Columns in registration order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Number of registered columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether no column is registered.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Case-insensitive column lookup.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.index.get(&fold(name)).map(|&i| &self.columns[i])
    }

    /// Whether a column with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&fold(name))
    }

    /// Append a column.
    pub fn register(&mut self, column: Column) -> Result<()> {
        let key = fold(column.name());
        if self.index.contains_key(&key) {
            return Err(SchemaError::duplicate_column(&self.name, column.name()));
        }
        let _ = self.index.insert(key, self.columns.len());
        self.columns.push(column);
        Ok(())
    }

    /// Remove a column, returning it.
    pub fn remove(&mut self, name: &str) -> Result<Column> {
        let Some(position) = self.index.get(&fold(name)).copied() else {
            return Err(SchemaError::column_not_found(&self.name, name));
        };
        let column = self.columns.remove(position);
        self.reindex();
        Ok(column)
    }

    /// Rename a column in place, keeping its position and metadata.
    pub fn rename_column(&mut self, from: &str, to: &str) -> Result<()> {
        let Some(position) = self.index.get(&fold(from)).copied() else {
            return Err(SchemaError::column_not_found(&self.name, from));
        };
        // A pure case change of the same column is allowed.
        if let Some(&other) = self.index.get(&fold(to)) {
            if other != position {
                return Err(SchemaError::duplicate_column(&self.name, to));
            }
        }
        self.columns[position] = self.columns[position].renamed(to);
        self.reindex();
        Ok(())
    }

    /// The same table under a new name.
    #[must_use]
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    /// Primary key columns in registration order.
    pub fn primary_key(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_primary_key())
    }

    /// Collection columns in registration order.
    pub fn collection_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.satellite().is_some())
    }

    /// Satellite tables owned by collection columns.
    pub fn satellite_tables(&self) -> impl Iterator<Item = &Table> {
        self.columns.iter().filter_map(Column::satellite)
    }

    /// Columns stored on this table's own rows (everything but collections).
    pub fn stored_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.satellite().is_none())
    }

    fn reindex(&mut self) {
        self.index = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| (fold(c.name()), i))
            .collect();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    use super::*;
    use crate::types::ColumnType;

    fn entities() -> Table {
        Table::with_columns(
            "Entities",
            [
                Column::new("Id", ColumnType::UniqueId).primary_key(),
                Column::user("Property", ColumnType::Int32),
                Column::user("Name", ColumnType::string()),
            ],
        )
        .unwrap()
    }

    fn names(table: &Table) -> Vec<&str> {
        table.columns().iter().map(Column::name).collect()
    }

    #[test]
    fn registration_order_is_preserved() {
        assert_eq!(names(&entities()), ["Id", "Property", "Name"]);
    }

    #[test]
    fn duplicate_names_rejected_case_insensitively() {
        let mut table = entities();
        let err = table
            .register(Column::user("PROPERTY", ColumnType::Int64))
            .unwrap_err();
        assert_eq!(err, SchemaError::duplicate_column("Entities", "PROPERTY"));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let table = entities();
        assert_eq!(table.column("property").unwrap().name(), "Property");
        assert!(table.contains("NAME"));
        assert!(!table.contains("Missing"));
    }

    #[test]
    fn remove_keeps_other_columns_and_index() {
        let mut table = entities();
        let removed = table.remove("property").unwrap();
        assert_eq!(removed.name(), "Property");
        assert_eq!(names(&table), ["Id", "Name"]);
        assert_eq!(table.column("Name").unwrap().name(), "Name");
    }

    #[test]
    fn remove_missing_column_fails() {
        let mut table = entities();
        assert_matches!(
            table.remove("Nope"),
            Err(SchemaError::ColumnNotFound { table, column }) if table == "Entities" && column == "Nope"
        );
    }

    #[test]
    fn rename_column_keeps_position() {
        let mut table = entities();
        table.rename_column("Property", "NewProperty").unwrap();
        assert_eq!(names(&table), ["Id", "NewProperty", "Name"]);
        assert!(table.contains("newproperty"));
        assert!(!table.contains("Property"));
    }

    #[test]
    fn rename_column_onto_existing_fails() {
        let mut table = entities();
        assert_matches!(
            table.rename_column("Property", "name"),
            Err(SchemaError::DuplicateColumn { .. })
        );
    }

    #[test]
    fn rename_column_case_only() {
        let mut table = entities();
        table.rename_column("Property", "PROPERTY").unwrap();
        assert_eq!(names(&table), ["Id", "PROPERTY", "Name"]);
    }

    #[test]
    fn renamed_table_preserves_columns() {
        let table = entities();
        let renamed = table.renamed("NewEntities");
        assert_eq!(renamed.name(), "NewEntities");
        assert_eq!(renamed.columns(), table.columns());
    }

    #[test]
    fn deserialize_revalidates_uniqueness() {
        let json = serde_json::json!({
            "name": "T",
            "columns": [
                {"name": "a", "columnType": {"kind": "int32"}},
                {"name": "A", "columnType": {"kind": "int32"}}
            ]
        });
        assert!(serde_json::from_value::<Table>(json).is_err());
    }

    #[test]
    fn serde_round_trip() {
        let table = entities();
        let json = serde_json::to_string(&table).unwrap();
        let back: Table = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
        assert!(back.contains("property"));
    }

    proptest! {
        #[test]
        fn registered_names_are_unique_ignoring_case(names in proptest::collection::vec("[a-zA-Z]{1,4}", 0..16)) {
            let mut table = Table::new("T");
            for name in &names {
                let _ = table.register(Column::user_untyped(name.as_str()));
            }
            let mut folded: Vec<_> = table.columns().iter().map(|c| fold(c.name())).collect();
            let before = folded.len();
            folded.sort();
            folded.dedup();
            prop_assert_eq!(before, folded.len());
            for name in &names {
                prop_assert!(table.contains(name));
            }
        }
    }
}
