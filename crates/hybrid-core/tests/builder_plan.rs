#![allow(missing_docs)]

use assert_matches::assert_matches;
use hybrid_core::{
    Column, ColumnType, DocumentTable, MigrationBuilder, MigrationCommand, MigrationPlan,
    SchemaError,
};

fn document_schema() -> DocumentTable {
    let mut doc = DocumentTable::new("Orders");
    doc.register(Column::user("Customer", ColumnType::String { max_len: Some(80) }))
        .unwrap();
    doc.register(Column::user("Total", ColumnType::Double)).unwrap();
    let _ = doc.add_collection("Lines", ColumnType::Int64).unwrap();
    doc
}

#[test]
fn rename_column_serializes_flat() {
    let mut builder = MigrationBuilder::new();
    let _ = builder.rename_column("Entities", "Property", "NewProperty");
    let plan = builder.build().unwrap();

    insta::assert_json_snapshot!(plan.commands()[0], @r#"
    {
      "op": "renameColumn",
      "table": "Entities",
      "from": "Property",
      "to": "NewProperty"
    }
    "#);
}

#[test]
fn plan_survives_json() {
    let mut builder = MigrationBuilder::new();
    let _ = builder
        .add_table_and_columns_and_associated_tables(&document_schema())
        .add_column("Orders", "Notes", "nvarchar(max)")
        .rename_table("Orders", "PurchaseOrders");
    let plan = builder.build().unwrap();

    let json = serde_json::to_string(&plan).unwrap();
    let back: MigrationPlan = serde_json::from_str(&json).unwrap();
    assert_eq!(back, plan);
    assert_eq!(back.len(), 4);
}

#[test]
fn hand_written_plan_file_parses() {
    let json = r#"[
        {"op": "addTable", "table": {"name": "Create", "columns": [
            {"name": "By", "columnType": {"kind": "string"}},
            {"name": "Id", "columnType": {"kind": "uniqueId"}, "primaryKey": true, "nullable": false}
        ]}},
        {"op": "addColumn", "table": "Create", "column": {"name": "At", "columnType": {"kind": "timestampOffset"}}}
    ]"#;
    let plan: MigrationPlan = serde_json::from_str(json).unwrap();
    assert_matches!(&plan.commands()[1], MigrationCommand::AddColumn { column, .. } if column.name() == "At");
}

#[test]
fn satellite_tables_follow_their_parent() {
    let mut builder = MigrationBuilder::new();
    let _ = builder.add_table_and_columns_and_associated_tables(&document_schema());
    let plan = builder.build().unwrap();

    let names: Vec<_> = plan.iter().map(MigrationCommand::table_name).collect();
    assert_eq!(names, ["Orders", "Orders_Lines"]);
}

#[test]
fn removing_a_built_in_column_after_expansion_fails() {
    let mut builder = MigrationBuilder::new();
    let _ = builder
        .add_table_and_columns_and_associated_tables(&document_schema())
        .rename_column("Orders", "CreatedAt", "Created");
    assert_matches!(builder.build(), Err(SchemaError::UnsupportedOperation(_)));
}

#[test]
fn payload_built_ins_are_fixed_after_expansion() {
    let mut builder = MigrationBuilder::new();
    let _ = builder
        .add_table_and_columns_and_associated_tables(&document_schema())
        .remove_column("Orders", "Document");
    assert_matches!(builder.build(), Err(SchemaError::UnsupportedOperation(_)));

    let mut builder = MigrationBuilder::new();
    let _ = builder
        .add_table_and_columns_and_associated_tables(&document_schema())
        .rename_column("Orders", "Version", "Ver");
    assert_matches!(builder.build(), Err(SchemaError::UnsupportedOperation(_)));

    let mut builder = MigrationBuilder::new();
    let _ = builder
        .add_table_and_columns_and_associated_tables(&document_schema())
        .rename_column("Orders", "Total", "GrandTotal")
        .remove_column("Orders", "Customer");
    assert_eq!(builder.build().unwrap().len(), 4);
}
