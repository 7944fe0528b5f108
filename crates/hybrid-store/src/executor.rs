//! Transactional execution of migration plans.
//!
//! A batch runs inside one [`MigrationScope`]. For each command the scope
//! checks the live catalog, renders the DDL and executes it. The first
//! failure rolls the whole batch back; nothing is committed until every
//! command and the optional post-check have succeeded.

use std::time::Instant;

use hybrid_core::{BackendMode, MigrationCommand, MigrationPlan, SchemaError};
use rusqlite::{Connection, Transaction};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::ddl;
use crate::errors::{Result, StoreError};
use crate::introspect::Introspector;

/// Outcome of a committed batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    /// Where the tables were placed.
    pub mode: BackendMode,
    /// Number of commands applied.
    pub commands: usize,
    /// Statements issued, in order.
    pub statements: Vec<String>,
    /// Wall time from begin to commit.
    pub elapsed_ms: u64,
}

/// An open migration transaction.
///
/// Dropping a scope without calling [`commit`](Self::commit) rolls it back.
pub struct MigrationScope<'c> {
    tx: Transaction<'c>,
    mode: BackendMode,
    statements: Vec<String>,
}

impl<'c> MigrationScope<'c> {
    /// Begin a deferred transaction on `conn`.
    pub fn begin(conn: &'c Connection, mode: BackendMode) -> Result<Self> {
        let tx = conn.unchecked_transaction()?;
        Ok(Self {
            tx,
            mode,
            statements: Vec::new(),
        })
    }

    /// Target mode of this scope.
    pub fn mode(&self) -> BackendMode {
        self.mode
    }

    /// Catalog view including this scope's uncommitted changes.
    pub fn introspector(&self) -> Introspector<'_> {
        Introspector::new(&self.tx)
    }

    /// Statements executed so far.
    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    /// Check `command` against the catalog, then execute its DDL.
    pub fn apply(&mut self, command: &MigrationCommand) -> Result<()> {
        self.precheck(command)?;
        let statement = ddl::render(command, self.mode)?;
        debug!(op = command.op(), table = command.table_name(), %statement, "executing ddl");
        let _ = self
            .tx
            .execute(&statement, [])
            .map_err(|source| StoreError::MigrationFailed {
                statement: statement.clone(),
                source,
            })?;
        self.statements.push(statement);
        Ok(())
    }

    /// Commit, returning the executed statements.
    pub fn commit(self) -> Result<Vec<String>> {
        self.tx.commit()?;
        Ok(self.statements)
    }

    /// Undo every statement executed in this scope.
    pub fn rollback(self) -> Result<()> {
        self.tx.rollback()?;
        Ok(())
    }

    fn precheck(&self, command: &MigrationCommand) -> Result<()> {
        let mode = self.mode;
        let catalog = self.introspector();
        let require_table = |table: &str| -> Result<()> {
            if catalog.table_exists(mode, table)? {
                Ok(())
            } else {
                Err(SchemaError::TableNotFound(table.to_owned()).into())
            }
        };
        let has_column = |table: &str, column: &str| -> Result<bool> {
            Ok(catalog.column(mode, table, column)?.is_some())
        };

        match command {
            MigrationCommand::AddTable { table } => {
                if catalog.table_exists(mode, table.name())? {
                    return Err(SchemaError::DuplicateTable(table.name().to_owned()).into());
                }
            }
            MigrationCommand::RemoveTable { table } => require_table(table)?,
            MigrationCommand::RenameTable { from, to } => {
                require_table(from)?;
                if !from.eq_ignore_ascii_case(to) && catalog.table_exists(mode, to)? {
                    return Err(SchemaError::DuplicateTable(to.clone()).into());
                }
            }
            MigrationCommand::AddColumn { table, column } => {
                require_table(table)?;
                if has_column(table, column.name())? {
                    return Err(duplicate_column(table, column.name()));
                }
            }
            MigrationCommand::RemoveColumn { table, column } => {
                require_table(table)?;
                if !has_column(table, column)? {
                    return Err(column_not_found(table, column));
                }
            }
            MigrationCommand::RenameColumn { table, from, to } => {
                require_table(table)?;
                if !has_column(table, from)? {
                    return Err(column_not_found(table, from));
                }
                if !from.eq_ignore_ascii_case(to) && has_column(table, to)? {
                    return Err(duplicate_column(table, to));
                }
            }
        }
        Ok(())
    }
}

fn duplicate_column(table: &str, column: &str) -> StoreError {
    SchemaError::DuplicateColumn {
        table: table.to_owned(),
        column: column.to_owned(),
    }
    .into()
}

fn column_not_found(table: &str, column: &str) -> StoreError {
    SchemaError::ColumnNotFound {
        table: table.to_owned(),
        column: column.to_owned(),
    }
    .into()
}

/// Runs plans against a connection in a fixed backend mode.
#[derive(Clone, Copy, Debug)]
pub struct MigrationExecutor {
    mode: BackendMode,
}

impl MigrationExecutor {
    /// Executor placing tables according to `mode`.
    pub fn new(mode: BackendMode) -> Self {
        Self { mode }
    }

    /// Target mode.
    pub fn mode(&self) -> BackendMode {
        self.mode
    }

    /// Apply `plan` as one all-or-nothing batch.
    pub fn execute(&self, conn: &Connection, plan: &MigrationPlan) -> Result<MigrationReport> {
        self.execute_checked(conn, plan, |_, _| Ok(()))
    }

    /// Apply `plan`, then let `check` inspect the uncommitted schema.
    ///
    /// An error from `check` rolls the batch back and is returned as is;
    /// return [`StoreError::Rejected`] to veto a batch.
    pub fn execute_checked<C>(
        &self,
        conn: &Connection,
        plan: &MigrationPlan,
        check: C,
    ) -> Result<MigrationReport>
    where
        C: FnOnce(&Introspector<'_>, BackendMode) -> Result<()>,
    {
        let started = Instant::now();
        let span = tracing::info_span!("migration", mode = %self.mode, commands = plan.len());
        let _entered = span.enter();
        info!("migration batch started");

        let mut scope = MigrationScope::begin(conn, self.mode)?;
        let outcome = run(&mut scope, plan).and_then(|()| check(&scope.introspector(), self.mode));

        if let Err(error) = outcome {
            warn!(%error, applied = scope.statements().len(), "migration batch rolled back");
            if let Err(rollback) = scope.rollback() {
                warn!(error = %rollback, "rollback failed");
            }
            return Err(error);
        }

        let statements = scope.commit()?;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(statements = statements.len(), elapsed_ms, "migration batch committed");

        Ok(MigrationReport {
            mode: self.mode,
            commands: plan.len(),
            statements,
            elapsed_ms,
        })
    }
}

fn run(scope: &mut MigrationScope<'_>, plan: &MigrationPlan) -> Result<()> {
    for command in plan {
        scope.apply(command)?;
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
