//! Read-only catalog queries.
//!
//! An [`Introspector`] borrows any connection, including the one inside an
//! open [`MigrationScope`](crate::executor::MigrationScope), so uncommitted
//! schema changes are visible to it. Name lookups are ASCII
//! case-insensitive, like the backend's own.

use hybrid_core::{BackendMode, ColumnType};
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;

use crate::errors::Result;
use crate::sql::schema_name;

/// One column as the catalog reports it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
    /// Column name as stored.
    pub name: String,
    /// Declared type, e.g. `NVARCHAR(40)`.
    pub declared_type: String,
    /// Whether the column is declared `NOT NULL`.
    pub not_null: bool,
    /// 1-based position within the primary key, 0 when not part of it.
    pub pk: u32,
}

impl ColumnInfo {
    /// Whether the column is part of the primary key.
    pub fn is_primary_key(&self) -> bool {
        self.pk > 0
    }

    /// Logical type recovered from the declared type.
    pub fn column_type(&self) -> Option<ColumnType> {
        ColumnType::parse(&self.declared_type).ok()
    }
}

/// Catalog queries over a borrowed connection.
#[derive(Clone, Copy)]
pub struct Introspector<'c> {
    conn: &'c Connection,
}

impl<'c> Introspector<'c> {
    /// Inspect through `conn`.
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Whether `table` exists in the schema of `mode`.
    pub fn table_exists(&self, mode: BackendMode, table: &str) -> Result<bool> {
        Ok(self.table_name(mode, table)?.is_some())
    }

    /// The stored spelling of `table`, if it exists.
    pub fn table_name(&self, mode: BackendMode, table: &str) -> Result<Option<String>> {
        let sql = format!(
            "SELECT name FROM {}.sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
            schema_name(mode)
        );
        let name = self
            .conn
            .query_row(&sql, [table], |row| row.get(0))
            .optional()?;
        Ok(name)
    }

    /// User tables of `mode`, sorted by name.
    pub fn tables(&self, mode: BackendMode) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT name FROM {}.sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\' \
             ORDER BY name",
            schema_name(mode)
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
    }

    /// Columns of `table` in declared order. Empty when the table is missing.
    pub fn columns(&self, mode: BackendMode, table: &str) -> Result<Vec<ColumnInfo>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, type, \"notnull\", pk FROM pragma_table_info(?1, ?2) ORDER BY cid",
        )?;
        let columns = stmt
            .query_map([table, schema_name(mode)], |row| {
                Ok(ColumnInfo {
                    name: row.get(0)?,
                    declared_type: row.get(1)?,
                    not_null: row.get(2)?,
                    pk: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(columns)
    }

    /// One column of `table`, looked up case-insensitively.
    pub fn column(&self, mode: BackendMode, table: &str, column: &str) -> Result<Option<ColumnInfo>> {
        Ok(self
            .columns(mode, table)?
            .into_iter()
            .find(|c| c.name.eq_ignore_ascii_case(column)))
    }

    /// Primary key columns of `table` in key order.
    pub fn primary_key(&self, mode: BackendMode, table: &str) -> Result<Vec<ColumnInfo>> {
        let mut key: Vec<_> = self
            .columns(mode, table)?
            .into_iter()
            .filter(ColumnInfo::is_primary_key)
            .collect();
        key.sort_by_key(|c| c.pk);
        Ok(key)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
