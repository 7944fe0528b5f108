//! The store entry point.
//!
//! [`DocumentStore`] owns one connection and the backend mode every
//! migration through it uses. A store opened for testing forces ephemeral
//! mode, so its tables live in the connection's `temp` schema and disappear
//! on close.

use std::path::{Path, PathBuf};

use hybrid_core::{BackendMode, MigrationBuilder, MigrationPlan};
use hybrid_settings::HybridSettings;
use parking_lot::Mutex;
use rusqlite::{Connection, Params, Row};
use tracing::info;

use crate::connection::{self, ConnectionConfig};
use crate::errors::Result;
use crate::executor::{MigrationExecutor, MigrationReport};
use crate::introspect::Introspector;

/// A document store connection with a fixed migration mode.
pub struct DocumentStore {
    conn: Mutex<Connection>,
    mode: BackendMode,
    path: Option<PathBuf>,
}

impl DocumentStore {
    /// Open a database file; migrations create durable tables.
    pub fn open(path: impl AsRef<Path>, config: &ConnectionConfig) -> Result<Self> {
        Self::open_file(path.as_ref(), config, BackendMode::Durable)
    }

    /// Open a private in-memory database; migrations create durable tables.
    pub fn open_in_memory(config: &ConnectionConfig) -> Result<Self> {
        Ok(Self::new(connection::open_in_memory(config)?, BackendMode::Durable, None))
    }

    /// Open a database file whose migrations only create ephemeral tables.
    ///
    /// Durable tables in the file are left untouched and tables created
    /// through this store are invisible to every other connection.
    pub fn for_testing_with_temp_tables(
        path: impl AsRef<Path>,
        config: &ConnectionConfig,
    ) -> Result<Self> {
        Self::open_file(path.as_ref(), config, BackendMode::Ephemeral)
    }

    /// In-memory database in ephemeral mode.
    pub fn for_testing_in_memory() -> Result<Self> {
        let conn = connection::open_in_memory(&ConnectionConfig::default())?;
        Ok(Self::new(conn, BackendMode::Ephemeral, None))
    }

    /// Open according to `settings.database`. No path means in-memory.
    pub fn from_settings(settings: &HybridSettings) -> Result<Self> {
        let database = &settings.database;
        let config = ConnectionConfig::from(database);
        match &database.path {
            Some(path) => Self::open_file(Path::new(path), &config, database.mode),
            None => Ok(Self::new(
                connection::open_in_memory(&config)?,
                database.mode,
                None,
            )),
        }
    }

    fn open_file(path: &Path, config: &ConnectionConfig, mode: BackendMode) -> Result<Self> {
        let conn = connection::open_file(path, config, mode)?;
        info!(path = %path.display(), %mode, "document store opened");
        Ok(Self::new(conn, mode, Some(path.to_owned())))
    }

    fn new(conn: Connection, mode: BackendMode, path: Option<PathBuf>) -> Self {
        Self {
            conn: Mutex::new(conn),
            mode,
            path,
        }
    }

    /// Mode every migration through this store uses.
    pub fn mode(&self) -> BackendMode {
        self.mode
    }

    /// Database file, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Build a batch with `build` and apply it.
    pub fn migrate<F>(&self, build: F) -> Result<MigrationReport>
    where
        F: FnOnce(&mut MigrationBuilder),
    {
        self.migrate_checked(build, |_, _| Ok(()))
    }

    /// Build and apply a batch, letting `check` inspect the uncommitted
    /// schema before commit. An error from `check` rolls the batch back.
    pub fn migrate_checked<F, C>(&self, build: F, check: C) -> Result<MigrationReport>
    where
        F: FnOnce(&mut MigrationBuilder),
        C: FnOnce(&Introspector<'_>, BackendMode) -> Result<()>,
    {
        let mut builder = MigrationBuilder::new();
        build(&mut builder);
        let plan = builder.build()?;
        let conn = self.conn.lock();
        MigrationExecutor::new(self.mode).execute_checked(&conn, &plan, check)
    }

    /// Apply a prebuilt plan.
    pub fn plan(&self, plan: &MigrationPlan) -> Result<MigrationReport> {
        let conn = self.conn.lock();
        MigrationExecutor::new(self.mode).execute(&conn, plan)
    }

    /// Run a read query, mapping each row.
    pub fn raw_query<T, P, F>(&self, sql: &str, params: P, map: F) -> Result<Vec<T>>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, map)?.collect::<rusqlite::Result<Vec<T>>>()?;
        Ok(rows)
    }

    /// Run a single write statement, returning the number of changed rows.
    pub fn raw_execute<P: Params>(&self, sql: &str, params: P) -> Result<usize> {
        Ok(self.conn.lock().execute(sql, params)?)
    }

    /// Inspect the catalog.
    pub fn introspect<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Introspector<'_>, BackendMode) -> Result<T>,
    {
        let conn = self.conn.lock();
        f(&Introspector::new(&conn), self.mode)
    }

    /// Close the connection, dropping any ephemeral tables.
    pub fn close(self) -> Result<()> {
        let conn = self.conn.into_inner();
        conn.close().map_err(|(_, e)| e)?;
        info!("document store closed");
        Ok(())
    }
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("mode", &self.mode)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
