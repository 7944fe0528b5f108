//! Fluent construction of migration batches.
//!
//! ```ignore
//! let mut builder = MigrationBuilder::new();
//! builder
//!     .add_table("Entities", ["Id UniqueIdentifier", "Property int"])
//!     .rename_column("Entities", "Property", "NewProperty");
//! let plan = builder.build()?;
//! ```
//!
//! Every operation records commands and returns `&mut Self`. Parse errors in
//! column specs are held back until [`MigrationBuilder::build`], which also
//! validates the batch as a whole.

use crate::command::MigrationCommand;
use crate::errors::{Result, SchemaError};
use crate::plan::MigrationPlan;
use crate::schema::{Column, DocumentTable, Table};
use crate::types::ColumnType;

/// A column given either as a `"Name type"` spec or as a ready [`Column`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColumnSpec {
    /// Textual spec, parsed at build time.
    Text(String),
    /// Fully described column.
    Column(Column),
}

impl ColumnSpec {
    fn into_column(self) -> Result<Column> {
        match self {
            Self::Text(spec) => Column::from_spec(&spec),
            Self::Column(column) => Ok(column),
        }
    }
}

impl From<&str> for ColumnSpec {
    fn from(spec: &str) -> Self {
        Self::Text(spec.to_owned())
    }
}

impl From<String> for ColumnSpec {
    fn from(spec: String) -> Self {
        Self::Text(spec)
    }
}

impl From<Column> for ColumnSpec {
    fn from(column: Column) -> Self {
        Self::Column(column)
    }
}

/// Accumulates migration commands for one batch.
#[derive(Clone, Debug, Default)]
pub struct MigrationBuilder {
    commands: Vec<MigrationCommand>,
    error: Option<SchemaError>,
}

impl MigrationBuilder {
    /// An empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table from column specs.
    ///
    /// Collection columns among `columns` also create their satellite tables.
    pub fn add_table<I, S>(&mut self, name: &str, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ColumnSpec>,
    {
        let columns: Result<Vec<Column>> = columns
            .into_iter()
            .map(|spec| spec.into().into_column())
            .collect();
        match columns.and_then(|columns| Table::with_columns(name, columns)) {
            Ok(table) => self.push_table(&table),
            Err(e) => self.defer(e),
        }
        self
    }

    /// Create a table from a prepared [`Table`], satellites included.
    pub fn add_table_schema(&mut self, table: &Table) -> &mut Self {
        self.push_table(table);
        self
    }

    /// Create a document table with all of its columns and one satellite
    /// table per collection column.
    pub fn add_table_and_columns_and_associated_tables(
        &mut self,
        table: &DocumentTable,
    ) -> &mut Self {
        self.push_table(table.table());
        self
    }

    /// Drop a table.
    pub fn remove_table(&mut self, name: &str) -> &mut Self {
        self.commands.push(MigrationCommand::RemoveTable {
            table: name.to_owned(),
        });
        self
    }

    /// Rename a table.
    pub fn rename_table(&mut self, from: &str, to: &str) -> &mut Self {
        self.commands.push(MigrationCommand::RenameTable {
            from: from.to_owned(),
            to: to.to_owned(),
        });
        self
    }

    /// Add a column declared by a textual type spec such as `"int"`.
    pub fn add_column(&mut self, table: &str, column: &str, type_spec: &str) -> &mut Self {
        match ColumnType::parse(type_spec) {
            Ok(column_type) => self.add_typed_column(table, Column::user(column, column_type)),
            Err(e) => {
                self.defer(e);
                self
            }
        }
    }

    /// Add a fully described column.
    ///
    /// A collection column is not stored on `table`; it creates its
    /// satellite table instead, which must belong to `table`.
    pub fn add_typed_column(&mut self, table: &str, column: Column) -> &mut Self {
        match column.satellite() {
            Some(satellite) => {
                let expected = format!("{table}_{}", column.name());
                if satellite.name().eq_ignore_ascii_case(&expected) {
                    self.commands.push(MigrationCommand::AddTable {
                        table: satellite.clone(),
                    });
                } else {
                    self.defer(SchemaError::UnsupportedOperation(format!(
                        "collection column {} belongs to {}, not {expected}",
                        column.name(),
                        satellite.name()
                    )));
                }
            }
            None => self.commands.push(MigrationCommand::AddColumn {
                table: table.to_owned(),
                column,
            }),
        }
        self
    }

    /// Drop a column.
    pub fn remove_column(&mut self, table: &str, column: &str) -> &mut Self {
        self.commands.push(MigrationCommand::RemoveColumn {
            table: table.to_owned(),
            column: column.to_owned(),
        });
        self
    }

    /// Rename a column.
    pub fn rename_column(&mut self, table: &str, from: &str, to: &str) -> &mut Self {
        self.commands.push(MigrationCommand::RenameColumn {
            table: table.to_owned(),
            from: from.to_owned(),
            to: to.to_owned(),
        });
        self
    }

    /// Commands recorded so far, before validation.
    pub fn commands(&self) -> &[MigrationCommand] {
        &self.commands
    }

    /// Validate the batch and return it as a plan.
    ///
    /// Reports the first deferred parse error, if any, before validating.
    pub fn build(&self) -> Result<MigrationPlan> {
        if let Some(e) = &self.error {
            return Err(e.clone());
        }
        let plan = MigrationPlan::new(self.commands.clone())?;
        tracing::debug!(commands = plan.len(), "migration plan built");
        Ok(plan)
    }

    fn push_table(&mut self, table: &Table) {
        let stored = Table::from_parts(
            table.name().to_owned(),
            table.stored_columns().cloned().collect(),
        );
        self.commands.push(MigrationCommand::AddTable { table: stored });
        for satellite in table.satellite_tables() {
            self.commands.push(MigrationCommand::AddTable {
                table: satellite.clone(),
            });
        }
    }

    fn defer(&mut self, error: SchemaError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
