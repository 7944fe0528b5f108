//! DDL rendering for migration commands.

use hybrid_core::{BackendMode, Column, MigrationCommand, MigrationPlan, Result, SchemaError, Table};

use crate::sql::{qualified, quote_identifier, sql_type};

/// Render the statement that applies `command` in `mode`.
pub fn render(command: &MigrationCommand, mode: BackendMode) -> Result<String> {
    match command {
        MigrationCommand::AddTable { table } => create_table(table, mode),
        MigrationCommand::RemoveTable { table } => Ok(format!("DROP TABLE {}", qualified(mode, table)?)),
        MigrationCommand::RenameTable { from, to } => Ok(format!(
            "ALTER TABLE {} RENAME TO {}",
            qualified(mode, from)?,
            quote_identifier(to)?
        )),
        MigrationCommand::AddColumn { table, column } => add_column(table, column, mode),
        MigrationCommand::RemoveColumn { table, column } => Ok(format!(
            "ALTER TABLE {} DROP COLUMN {}",
            qualified(mode, table)?,
            quote_identifier(column)?
        )),
        MigrationCommand::RenameColumn { table, from, to } => Ok(format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            qualified(mode, table)?,
            quote_identifier(from)?,
            quote_identifier(to)?
        )),
    }
}

/// Render every statement of a plan, in order.
pub fn render_plan(plan: &MigrationPlan, mode: BackendMode) -> Result<Vec<String>> {
    plan.iter().map(|command| render(command, mode)).collect()
}

fn create_table(table: &Table, mode: BackendMode) -> Result<String> {
    let columns: Vec<&Column> = table.stored_columns().collect();
    if columns.is_empty() {
        return Err(SchemaError::EmptyTable(table.name().to_owned()));
    }
    let key: Vec<&Column> = columns.iter().copied().filter(|c| c.is_primary_key()).collect();
    let inline_key = key.len() == 1;

    let mut parts = Vec::with_capacity(columns.len() + 1);
    for column in &columns {
        let mut def = column_definition(column)?;
        if !column.is_nullable() {
            def.push_str(" NOT NULL");
        }
        if inline_key && column.is_primary_key() {
            def.push_str(" PRIMARY KEY");
        }
        parts.push(def);
    }
    if key.len() > 1 {
        let names = key
            .iter()
            .map(|c| quote_identifier(c.name()))
            .collect::<Result<Vec<_>>>()?;
        parts.push(format!("PRIMARY KEY ({})", names.join(", ")));
    }

    Ok(format!(
        "CREATE TABLE {} ({})",
        qualified(mode, table.name())?,
        parts.join(", ")
    ))
}

fn add_column(table: &str, column: &Column, mode: BackendMode) -> Result<String> {
    let refuse = |what: &str| {
        SchemaError::UnsupportedOperation(format!(
            "cannot add {what} column {}.{} to an existing table",
            table,
            column.name()
        ))
    };
    if column.satellite().is_some() {
        return Err(refuse("a collection"));
    }
    if column.is_primary_key() {
        return Err(refuse("a primary key"));
    }
    if !column.is_nullable() {
        return Err(refuse("a NOT NULL"));
    }
    Ok(format!(
        "ALTER TABLE {} ADD COLUMN {}",
        qualified(mode, table)?,
        column_definition(column)?
    ))
}

fn column_definition(column: &Column) -> Result<String> {
    Ok(format!(
        "{} {}",
        quote_identifier(column.name())?,
        sql_type(column.column_type())
    ))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use hybrid_core::{ColumnType, DocumentTable, MigrationBuilder};

    use super::*;

    fn rendered(command: &MigrationCommand) -> String {
        render(command, BackendMode::Durable).unwrap()
    }

    #[test]
    fn create_table_with_inline_key() {
        let table = Table::with_columns(
            "Entities",
            [
                Column::new("Id", ColumnType::UniqueId).primary_key(),
                Column::user("Property", ColumnType::Int32),
            ],
        )
        .unwrap();
        insta::assert_snapshot!(
            rendered(&MigrationCommand::AddTable { table }),
            @r#"CREATE TABLE main."Entities" ("Id" UNIQUEIDENTIFIER NOT NULL PRIMARY KEY, "Property" INT)"#
        );
    }

    #[test]
    fn satellite_gets_composite_key() {
        let column = Column::collection("Entities", "Tags", ColumnType::String { max_len: Some(40) });
        let table = column.satellite().unwrap().clone();
        insta::assert_snapshot!(
            render(&MigrationCommand::AddTable { table }, BackendMode::Ephemeral).unwrap(),
            @r#"CREATE TABLE temp."Entities_Tags" ("DocumentId" UNIQUEIDENTIFIER NOT NULL, "Ordinal" INT NOT NULL, "Value" NVARCHAR(40), PRIMARY KEY ("DocumentId", "Ordinal"))"#
        );
    }

    #[test]
    fn document_table_statement() {
        let mut builder = MigrationBuilder::new();
        let _ = builder.add_table_and_columns_and_associated_tables(&DocumentTable::new("Entities"));
        let statements = render_plan(&builder.build().unwrap(), BackendMode::Durable).unwrap();
        insta::assert_snapshot!(
            statements.join("\n"),
            @r#"CREATE TABLE main."Entities" ("Id" UNIQUEIDENTIFIER NOT NULL PRIMARY KEY, "Etag" UNIQUEIDENTIFIER NOT NULL, "CreatedAt" DATETIMEOFFSET NOT NULL, "ModifiedAt" DATETIMEOFFSET NOT NULL, "Document" BLOB, "Discriminator" NCHAR(255), "State" NCHAR(255), "Version" INT)"#
        );
    }

    #[test]
    fn alter_statements() {
        let cases = [
            (
                MigrationCommand::RemoveTable { table: "Entities".into() },
                r#"DROP TABLE main."Entities""#,
            ),
            (
                MigrationCommand::RenameTable {
                    from: "Entities".into(),
                    to: "NewEntities".into(),
                },
                r#"ALTER TABLE main."Entities" RENAME TO "NewEntities""#,
            ),
            (
                MigrationCommand::AddColumn {
                    table: "Create".into(),
                    column: Column::user("By", ColumnType::Int32),
                },
                r#"ALTER TABLE main."Create" ADD COLUMN "By" INT"#,
            ),
            (
                MigrationCommand::RemoveColumn {
                    table: "Entities".into(),
                    column: "Property".into(),
                },
                r#"ALTER TABLE main."Entities" DROP COLUMN "Property""#,
            ),
            (
                MigrationCommand::RenameColumn {
                    table: "Entities".into(),
                    from: "Property".into(),
                    to: "NewProperty".into(),
                },
                r#"ALTER TABLE main."Entities" RENAME COLUMN "Property" TO "NewProperty""#,
            ),
        ];
        for (command, expected) in cases {
            assert_eq!(rendered(&command), expected);
        }
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        let command = MigrationCommand::RemoveTable { table: "we\"ird".into() };
        assert_eq!(rendered(&command), r#"DROP TABLE main."we""ird""#);
    }

    #[test]
    fn cannot_add_key_or_not_null_column() {
        for column in [
            Column::new("Id", ColumnType::UniqueId).primary_key(),
            Column::user("Required", ColumnType::Int32).not_null(),
        ] {
            let command = MigrationCommand::AddColumn {
                table: "Entities".into(),
                column,
            };
            assert_matches!(
                render(&command, BackendMode::Durable),
                Err(SchemaError::UnsupportedOperation(_))
            );
        }
    }

    #[test]
    fn nul_in_name_is_rejected() {
        let command = MigrationCommand::RemoveTable { table: "a\0b".into() };
        assert_matches!(
            render(&command, BackendMode::Durable),
            Err(SchemaError::InvalidIdentifier(_))
        );
    }
}
