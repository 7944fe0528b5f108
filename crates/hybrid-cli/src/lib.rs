//! # hybrid-cli
//!
//! Command-line runner for hybrid schema migrations.
//!
//! ```text
//! hybrid migrate plan.json --db store.db [--ephemeral] [--dry-run]
//! hybrid inspect Entities --db store.db
//! ```
//!
//! `migrate --ephemeral` is a validation run: the plan is applied to
//! connection-scoped tables that are discarded when the command exits, so
//! the database file is left unchanged. `inspect` always reads durable
//! tables.
//!
//! A plan file is a JSON array of steps, each mapped onto one
//! [`MigrationBuilder`] call:
//!
//! ```json
//! [
//!   {"op": "addTable", "table": "Entities", "columns": ["Id UniqueIdentifier", "Property int"]},
//!   {"op": "renameColumn", "table": "Entities", "from": "Property", "to": "NewProperty"}
//! ]
//! ```

#![deny(unsafe_code)]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use hybrid_core::{BackendMode, Column, ColumnType, DocumentTable, MigrationBuilder, MigrationPlan};
use hybrid_settings::HybridSettings;
use hybrid_store::{ColumnInfo, DocumentStore, ddl};
use serde::{Deserialize, Serialize};

/// Hybrid document store schema tool.
#[derive(Parser, Debug)]
#[command(name = "hybrid", version, about = "Apply and inspect hybrid document store schema migrations")]
pub struct Cli {
    /// Settings file (default: `~/.hybrid/settings.json`).
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// What to do.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply a JSON plan file as one all-or-nothing batch.
    Migrate(MigrateArgs),
    /// Show the columns of a table.
    Inspect(InspectArgs),
}

/// Database selection for `migrate`.
#[derive(Args, Debug, Clone)]
pub struct Target {
    /// Database file (overrides settings).
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Apply into connection-scoped tables that are discarded on exit,
    /// leaving the database file unchanged.
    #[arg(long)]
    pub ephemeral: bool,
}

/// `hybrid migrate`.
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Plan file.
    pub plan: PathBuf,

    /// Database selection.
    #[command(flatten)]
    pub target: Target,

    /// Print the DDL instead of executing it.
    #[arg(long)]
    pub dry_run: bool,
}

/// `hybrid inspect`.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Table name (case-insensitive).
    pub table: String,

    /// Database file (overrides settings).
    #[arg(long)]
    pub db: Option<PathBuf>,
}

impl Cli {
    /// Load settings from `--settings` or the default path.
    pub fn load_settings(&self) -> Result<HybridSettings> {
        let path = self
            .settings
            .clone()
            .unwrap_or_else(hybrid_settings::settings_path);
        hybrid_settings::load_settings_from_path(&path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Plan files
// ─────────────────────────────────────────────────────────────────────────────

/// A column in a plan file: a `"Name type"` spec or a full column object.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnEntry {
    /// `"Name type"` spec.
    Spec(String),
    /// Full column description.
    Column(Column),
}

/// A collection projection of a document table.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionEntry {
    /// Column name; the satellite table is `<Table>_<name>`.
    pub name: String,
    /// Element type spec, e.g. `"nvarchar(40)"`.
    pub element_type: String,
}

/// One step of a plan file.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum PlanStep {
    /// Create a plain table.
    AddTable {
        /// Table name.
        table: String,
        /// Columns in order.
        columns: Vec<ColumnEntry>,
    },
    /// Create a document table with its built-in columns and satellites.
    AddDocumentTable {
        /// Table name.
        table: String,
        /// User columns following the built-ins.
        #[serde(default)]
        columns: Vec<ColumnEntry>,
        /// Collection projections.
        #[serde(default)]
        collections: Vec<CollectionEntry>,
    },
    /// Drop a table.
    RemoveTable {
        /// Table name.
        table: String,
    },
    /// Rename a table.
    RenameTable {
        /// Current name.
        from: String,
        /// New name.
        to: String,
    },
    /// Add a column.
    AddColumn {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
        /// Type spec; defaults to an unbounded string.
        #[serde(rename = "type", default)]
        column_type: Option<String>,
    },
    /// Drop a column.
    RemoveColumn {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
    },
    /// Rename a column.
    RenameColumn {
        /// Table name.
        table: String,
        /// Current name.
        from: String,
        /// New name.
        to: String,
    },
}

impl PlanStep {
    /// Record this step on `builder`.
    pub fn apply(&self, builder: &mut MigrationBuilder) -> Result<()> {
        match self {
            Self::AddTable { table, columns } => {
                let _ = builder.add_table(table, columns.iter().map(to_spec));
            }
            Self::AddDocumentTable {
                table,
                columns,
                collections,
            } => {
                let doc = document_table(table, columns, collections)?;
                let _ = builder.add_table_and_columns_and_associated_tables(&doc);
            }
            Self::RemoveTable { table } => {
                let _ = builder.remove_table(table);
            }
            Self::RenameTable { from, to } => {
                let _ = builder.rename_table(from, to);
            }
            Self::AddColumn {
                table,
                column,
                column_type,
            } => match column_type {
                Some(spec) => {
                    let _ = builder.add_column(table, column, spec);
                }
                None => {
                    let _ = builder.add_typed_column(table, Column::user_untyped(column.as_str()));
                }
            },
            Self::RemoveColumn { table, column } => {
                let _ = builder.remove_column(table, column);
            }
            Self::RenameColumn { table, from, to } => {
                let _ = builder.rename_column(table, from, to);
            }
        }
        Ok(())
    }
}

fn to_spec(entry: &ColumnEntry) -> hybrid_core::ColumnSpec {
    match entry {
        ColumnEntry::Spec(spec) => spec.as_str().into(),
        ColumnEntry::Column(column) => column.clone().into(),
    }
}

fn document_table(
    name: &str,
    columns: &[ColumnEntry],
    collections: &[CollectionEntry],
) -> Result<DocumentTable> {
    let mut doc = DocumentTable::new(name);
    for entry in columns {
        let column = match entry {
            ColumnEntry::Spec(spec) => Column::from_spec(spec)?,
            ColumnEntry::Column(column) => column.clone(),
        };
        doc.register(column)
            .with_context(|| format!("Invalid column for document table {name}"))?;
    }
    for collection in collections {
        let element_type = ColumnType::parse(&collection.element_type)?;
        let _ = doc
            .add_collection(collection.name.as_str(), element_type)
            .with_context(|| format!("Invalid collection for document table {name}"))?;
    }
    Ok(doc)
}

/// Read a plan file and validate it into a [`MigrationPlan`].
pub fn load_plan(path: &Path) -> Result<MigrationPlan> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read plan file {}", path.display()))?;
    let steps: Vec<PlanStep> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse plan file {}", path.display()))?;

    let mut builder = MigrationBuilder::new();
    for step in &steps {
        step.apply(&mut builder)?;
    }
    builder
        .build()
        .with_context(|| format!("Invalid plan {}", path.display()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Columns of one table, as printed by `hybrid inspect`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableReport {
    /// Table name as stored.
    pub table: String,
    /// Schema the table was found in.
    pub mode: BackendMode,
    /// Columns in declared order.
    pub columns: Vec<ColumnInfo>,
}

/// Run `cli` with already loaded `settings`, returning the text to print.
pub fn run(cli: &Cli, settings: HybridSettings) -> Result<String> {
    match &cli.command {
        Command::Migrate(args) => migrate(args, settings),
        Command::Inspect(args) => inspect(args, settings),
    }
}

fn apply_db(settings: &mut HybridSettings, db: Option<&Path>) {
    if let Some(db) = db {
        settings.database.path = Some(db.to_string_lossy().into_owned());
    }
}

fn migrate(args: &MigrateArgs, mut settings: HybridSettings) -> Result<String> {
    apply_db(&mut settings, args.target.db.as_deref());
    if args.target.ephemeral {
        settings.database.mode = BackendMode::Ephemeral;
    }
    let plan = load_plan(&args.plan)?;

    if args.dry_run {
        let statements = ddl::render_plan(&plan, settings.database.mode)?;
        return Ok(statements
            .iter()
            .map(|s| format!("{s};"))
            .collect::<Vec<_>>()
            .join("\n"));
    }

    if settings.database.path.is_none() {
        tracing::warn!("no database path configured, migrating an in-memory database");
    }
    if settings.database.mode.is_ephemeral() {
        tracing::info!("ephemeral run, migrated tables are discarded on exit");
    }
    let store = DocumentStore::from_settings(&settings).context("Failed to open database")?;
    let report = store.plan(&plan).context("Migration failed")?;
    store.close().context("Failed to close database")?;
    Ok(serde_json::to_string_pretty(&report)?)
}

fn inspect(args: &InspectArgs, mut settings: HybridSettings) -> Result<String> {
    apply_db(&mut settings, args.db.as_deref());
    // A fresh connection has no ephemeral tables to show.
    settings.database.mode = BackendMode::Durable;
    let store = DocumentStore::from_settings(&settings).context("Failed to open database")?;
    let report = store.introspect(|i, mode| {
        let Some(table) = i.table_name(mode, &args.table)? else {
            return Ok(None);
        };
        let columns = i.columns(mode, &table)?;
        Ok(Some(TableReport {
            table,
            mode,
            columns,
        }))
    })?;
    let Some(report) = report else {
        bail!("table not found: {}", args.table);
    };
    Ok(serde_json::to_string_pretty(&report)?)
}
