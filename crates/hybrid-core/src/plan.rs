//! Validated, ordered command lists.
//!
//! [`MigrationPlan`] is what the executor consumes. Constructing one replays
//! the commands against an in-memory picture of the tables the batch itself
//! creates, so conflicts that are visible without a backend fail here, before
//! any connection is touched. Tables the batch did not create are assumed to
//! exist; the executor checks those against the live catalog.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::command::MigrationCommand;
use crate::errors::{Result, SchemaError};
use crate::schema::table::fold;
use crate::schema::{DocumentTable, Table, validate_identifier};

/// An ordered, validated batch of migration commands.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<MigrationCommand>", into = "Vec<MigrationCommand>")]
pub struct MigrationPlan {
    commands: Vec<MigrationCommand>,
}

impl MigrationPlan {
    /// Validate and wrap a command list.
    pub fn new(commands: Vec<MigrationCommand>) -> Result<Self> {
        validate(&commands)?;
        Ok(Self { commands })
    }

    /// Commands in execution order.
    pub fn commands(&self) -> &[MigrationCommand] {
        &self.commands
    }

    /// Number of commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the plan does nothing.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Iterate over the commands.
    pub fn iter(&self) -> std::slice::Iter<'_, MigrationCommand> {
        self.commands.iter()
    }
}

impl<'a> IntoIterator for &'a MigrationPlan {
    type Item = &'a MigrationCommand;
    type IntoIter = std::slice::Iter<'a, MigrationCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}

impl TryFrom<Vec<MigrationCommand>> for MigrationPlan {
    type Error = SchemaError;

    fn try_from(commands: Vec<MigrationCommand>) -> Result<Self> {
        Self::new(commands)
    }
}

impl From<MigrationPlan> for Vec<MigrationCommand> {
    fn from(plan: MigrationPlan) -> Self {
        plan.commands
    }
}

/// A table created by this batch.
struct Shape {
    table: Table,
    /// Starts with the built-in document columns, which stay fixed.
    document: bool,
}

/// What the batch has established about a table so far.
enum Known {
    /// Created by this batch; every column is known.
    Shape(Shape),
    /// Exists, but its columns live in the backend.
    Exists,
    /// Removed or renamed away by this batch.
    Absent,
}

fn validate(commands: &[MigrationCommand]) -> Result<()> {
    let mut known: HashMap<String, Known> = HashMap::new();

    for command in commands {
        match command {
            MigrationCommand::AddTable { table } => {
                validate_identifier(table.name())?;
                for column in table.columns() {
                    validate_identifier(column.name())?;
                }
                if table.stored_columns().next().is_none() {
                    return Err(SchemaError::EmptyTable(table.name().to_owned()));
                }
                let key = fold(table.name());
                if matches!(known.get(&key), Some(Known::Shape(_) | Known::Exists)) {
                    return Err(SchemaError::DuplicateTable(table.name().to_owned()));
                }
                let shape = Shape {
                    document: DocumentTable::try_from(table.clone()).is_ok(),
                    table: table.clone(),
                };
                let _ = known.insert(key, Known::Shape(shape));
            }
            MigrationCommand::RemoveTable { table } => {
                validate_identifier(table)?;
                let key = fold(table);
                if matches!(known.get(&key), Some(Known::Absent)) {
                    return Err(SchemaError::TableNotFound(table.clone()));
                }
                let _ = known.insert(key, Known::Absent);
            }
            MigrationCommand::RenameTable { from, to } => {
                validate_identifier(from)?;
                validate_identifier(to)?;
                let (from_key, to_key) = (fold(from), fold(to));
                let source = known.remove(&from_key);
                if matches!(source, Some(Known::Absent)) {
                    return Err(SchemaError::TableNotFound(from.clone()));
                }
                if from_key != to_key
                    && matches!(known.get(&to_key), Some(Known::Shape(_) | Known::Exists))
                {
                    return Err(SchemaError::DuplicateTable(to.clone()));
                }
                let renamed = match source {
                    Some(Known::Shape(shape)) => Known::Shape(Shape {
                        table: shape.table.renamed(to.clone()),
                        document: shape.document,
                    }),
                    _ => Known::Exists,
                };
                let _ = known.insert(from_key, Known::Absent);
                let _ = known.insert(to_key, renamed);
            }
            MigrationCommand::AddColumn { table, column } => {
                validate_identifier(table)?;
                validate_identifier(column.name())?;
                if column.satellite().is_some() {
                    return Err(SchemaError::UnsupportedOperation(format!(
                        "collection column {table}.{} is stored in its own table",
                        column.name()
                    )));
                }
                if let Some(shape) = shape_of(&mut known, table)? {
                    shape.table.register(column.clone())?;
                }
            }
            MigrationCommand::RemoveColumn { table, column } => {
                validate_identifier(table)?;
                validate_identifier(column)?;
                if let Some(shape) = shape_of(&mut known, table)? {
                    reject_fixed_column(shape, column, "removed")?;
                    let _ = shape.table.remove(column)?;
                }
            }
            MigrationCommand::RenameColumn { table, from, to } => {
                validate_identifier(table)?;
                validate_identifier(from)?;
                validate_identifier(to)?;
                if let Some(shape) = shape_of(&mut known, table)? {
                    reject_fixed_column(shape, from, "renamed")?;
                    shape.table.rename_column(from, to)?;
                }
            }
        }
    }
    Ok(())
}

/// The known shape of `table`, `None` when only the backend knows it.
fn shape_of<'a>(known: &'a mut HashMap<String, Known>, table: &str) -> Result<Option<&'a mut Shape>> {
    match known.get_mut(&fold(table)) {
        Some(Known::Absent) => Err(SchemaError::TableNotFound(table.to_owned())),
        Some(Known::Shape(shape)) => Ok(Some(shape)),
        Some(Known::Exists) | None => Ok(None),
    }
}

/// System columns, and every built-in of a document table, cannot be
/// removed or renamed.
fn reject_fixed_column(shape: &Shape, column: &str, action: &str) -> Result<()> {
    let Some(existing) = shape.table.column(column) else {
        return Ok(());
    };
    let what = if shape.document && DocumentTable::is_built_in(existing.name()) {
        "built-in"
    } else if existing.is_system() {
        "system"
    } else {
        return Ok(());
    };
    Err(SchemaError::UnsupportedOperation(format!(
        "{what} column {}.{} cannot be {action}",
        shape.table.name(),
        existing.name()
    )))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::schema::Column;
    use crate::types::ColumnType;

    fn add_table(name: &str, columns: &[&str]) -> MigrationCommand {
        let columns = columns.iter().map(|s| Column::from_spec(s).unwrap());
        MigrationCommand::AddTable {
            table: Table::with_columns(name, columns).unwrap(),
        }
    }

    fn remove_table(name: &str) -> MigrationCommand {
        MigrationCommand::RemoveTable { table: name.into() }
    }

    fn rename_table(from: &str, to: &str) -> MigrationCommand {
        MigrationCommand::RenameTable {
            from: from.into(),
            to: to.into(),
        }
    }

    fn add_column(table: &str, spec: &str) -> MigrationCommand {
        MigrationCommand::AddColumn {
            table: table.into(),
            column: Column::from_spec(spec).unwrap(),
        }
    }

    #[test]
    fn empty_plan_is_valid() {
        let plan = MigrationPlan::new(Vec::new()).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn add_then_remove_is_valid() {
        let plan = MigrationPlan::new(vec![
            add_table("Entities", &["Id UniqueIdentifier"]),
            remove_table("Entities"),
        ])
        .unwrap();
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn duplicate_add_in_batch() {
        let err = MigrationPlan::new(vec![
            add_table("Entities", &["Id int"]),
            add_table("ENTITIES", &["Id int"]),
        ])
        .unwrap_err();
        assert_eq!(err, SchemaError::DuplicateTable("ENTITIES".into()));
    }

    #[test]
    fn table_without_columns() {
        let err = MigrationPlan::new(vec![MigrationCommand::AddTable {
            table: Table::new("Empty"),
        }])
        .unwrap_err();
        assert_eq!(err, SchemaError::EmptyTable("Empty".into()));
    }

    #[test]
    fn remove_twice() {
        let err = MigrationPlan::new(vec![remove_table("Entities"), remove_table("Entities")])
            .unwrap_err();
        assert_eq!(err, SchemaError::TableNotFound("Entities".into()));
    }

    #[test]
    fn rename_onto_table_added_in_batch() {
        let err = MigrationPlan::new(vec![
            add_table("A", &["Id int"]),
            add_table("B", &["Id int"]),
            rename_table("A", "B"),
        ])
        .unwrap_err();
        assert_eq!(err, SchemaError::DuplicateTable("B".into()));
    }

    #[test]
    fn rename_then_use_old_name() {
        let err = MigrationPlan::new(vec![
            add_table("Entities", &["Id int"]),
            rename_table("Entities", "NewEntities"),
            add_column("Entities", "Property int"),
        ])
        .unwrap_err();
        assert_eq!(err, SchemaError::TableNotFound("Entities".into()));
    }

    #[test]
    fn rename_carries_shape() {
        let err = MigrationPlan::new(vec![
            add_table("Entities", &["Id int", "Property int"]),
            rename_table("Entities", "NewEntities"),
            add_column("NewEntities", "property int"),
        ])
        .unwrap_err();
        assert_matches!(err, SchemaError::DuplicateColumn { table, .. } if table == "NewEntities");
    }

    #[test]
    fn case_only_table_rename_is_valid() {
        let _ = MigrationPlan::new(vec![
            add_table("Entities", &["Id int"]),
            rename_table("Entities", "ENTITIES"),
        ])
        .unwrap();
    }

    #[test]
    fn column_checks_against_known_shape() {
        assert_matches!(
            MigrationPlan::new(vec![
                add_table("Entities", &["Id int"]),
                MigrationCommand::RemoveColumn {
                    table: "Entities".into(),
                    column: "Property".into(),
                },
            ]),
            Err(SchemaError::ColumnNotFound { .. })
        );
        assert_matches!(
            MigrationPlan::new(vec![
                add_table("Entities", &["Id int", "Property int"]),
                MigrationCommand::RenameColumn {
                    table: "Entities".into(),
                    from: "Property".into(),
                    to: "ID".into(),
                },
            ]),
            Err(SchemaError::DuplicateColumn { .. })
        );
    }

    #[test]
    fn unknown_tables_are_deferred() {
        let plan = MigrationPlan::new(vec![
            add_column("Existing", "Property int"),
            MigrationCommand::RenameColumn {
                table: "Existing".into(),
                from: "Property".into(),
                to: "NewProperty".into(),
            },
            rename_table("Existing", "Renamed"),
            remove_table("Renamed"),
        ])
        .unwrap();
        assert_eq!(plan.len(), 4);
    }

    #[test]
    fn system_columns_are_protected_in_batch() {
        let table = crate::schema::DocumentTable::new("Entities").into_table();
        let err = MigrationPlan::new(vec![
            MigrationCommand::AddTable { table },
            MigrationCommand::RemoveColumn {
                table: "Entities".into(),
                column: "Etag".into(),
            },
        ])
        .unwrap_err();
        assert_matches!(err, SchemaError::UnsupportedOperation(_));
    }

    #[test]
    fn every_document_built_in_is_protected_in_batch() {
        let create = || MigrationCommand::AddTable {
            table: DocumentTable::new("Entities").into_table(),
        };
        for column in crate::schema::document_table::BUILT_IN_COLUMNS {
            let err = MigrationPlan::new(vec![
                create(),
                MigrationCommand::RemoveColumn {
                    table: "Entities".into(),
                    column: column.to_lowercase(),
                },
            ])
            .unwrap_err();
            assert_matches!(err, SchemaError::UnsupportedOperation(_), "remove {column}");

            let err = MigrationPlan::new(vec![
                create(),
                rename_table("Entities", "Documents"),
                MigrationCommand::RenameColumn {
                    table: "Documents".into(),
                    from: column.into(),
                    to: "Other".into(),
                },
            ])
            .unwrap_err();
            assert_matches!(err, SchemaError::UnsupportedOperation(_), "rename {column}");
        }
    }

    #[test]
    fn plain_tables_may_drop_columns_named_like_built_ins() {
        let plan = MigrationPlan::new(vec![
            add_table("Blobs", &["Id int", "Document blob", "Version int"]),
            MigrationCommand::RemoveColumn {
                table: "Blobs".into(),
                column: "Document".into(),
            },
            MigrationCommand::RenameColumn {
                table: "Blobs".into(),
                from: "Version".into(),
                to: "Revision".into(),
            },
        ])
        .unwrap();
        assert_eq!(plan.len(), 3);
    }

    #[test]
    fn document_user_columns_stay_mutable() {
        let mut doc = DocumentTable::new("Entities");
        doc.register(Column::user("Property", ColumnType::Int32)).unwrap();
        let plan = MigrationPlan::new(vec![
            MigrationCommand::AddTable {
                table: doc.into_table(),
            },
            MigrationCommand::RenameColumn {
                table: "Entities".into(),
                from: "Property".into(),
                to: "NewProperty".into(),
            },
            MigrationCommand::RemoveColumn {
                table: "Entities".into(),
                column: "NewProperty".into(),
            },
        ])
        .unwrap();
        assert_eq!(plan.len(), 3);
    }

    #[test]
    fn collection_column_cannot_be_added_in_place() {
        let err = MigrationPlan::new(vec![MigrationCommand::AddColumn {
            table: "Entities".into(),
            column: Column::collection("Entities", "Tags", ColumnType::Int32),
        }])
        .unwrap_err();
        assert_matches!(err, SchemaError::UnsupportedOperation(_));
    }

    #[test]
    fn blank_identifiers_rejected() {
        assert_matches!(
            MigrationPlan::new(vec![remove_table(" ")]),
            Err(SchemaError::InvalidIdentifier(_))
        );
    }

    #[test]
    fn deserializing_validates() {
        let json = serde_json::json!([
            {"op": "removeTable", "table": "A"},
            {"op": "removeTable", "table": "a"}
        ]);
        assert!(serde_json::from_value::<MigrationPlan>(json).is_err());
    }
}
