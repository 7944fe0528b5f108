//! `SQLite` connections with the store's pragmas applied.

use std::path::Path;

use hybrid_core::BackendMode;
use hybrid_settings::DatabaseSettings;
use rusqlite::Connection;
use tracing::debug;

use crate::errors::Result;

/// Per-connection settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Busy timeout in milliseconds (default: 5000).
    pub busy_timeout_ms: u32,
    /// Enforce foreign key constraints (default: on).
    pub foreign_keys: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
            foreign_keys: true,
        }
    }
}

impl From<&DatabaseSettings> for ConnectionConfig {
    fn from(settings: &DatabaseSettings) -> Self {
        Self {
            busy_timeout_ms: settings.busy_timeout_ms,
            foreign_keys: settings.foreign_keys,
        }
    }
}

/// Open (or create) a database file, creating parent directories.
///
/// Only durable connections switch the file to WAL. Journal mode is a
/// property of the file, and an ephemeral connection never writes to it.
pub fn open_file(path: &Path, config: &ConnectionConfig, mode: BackendMode) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(path)?;
    if !mode.is_ephemeral() {
        let _: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    }
    apply_pragmas(&conn, config)?;
    debug!(path = %path.display(), %mode, "database opened");
    Ok(conn)
}

/// Open a private in-memory database.
pub fn open_in_memory(config: &ConnectionConfig) -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    apply_pragmas(&conn, config)?;
    Ok(conn)
}

fn apply_pragmas(conn: &Connection, config: &ConnectionConfig) -> Result<()> {
    conn.execute_batch(&format!(
        "PRAGMA busy_timeout = {};\
         PRAGMA foreign_keys = {};",
        config.busy_timeout_ms,
        if config.foreign_keys { "ON" } else { "OFF" }
    ))?;
    Ok(())
}

/// Pragma state for verification.
#[derive(Debug)]
pub struct PragmaState {
    /// Journal mode (`wal` for files, `memory` for in-memory databases).
    pub journal_mode: String,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: u32,
    /// Whether foreign keys are enforced.
    pub foreign_keys_enabled: bool,
}

/// Read back the pragmas set by [`open_file`] / [`open_in_memory`].
pub fn verify_pragmas(conn: &Connection) -> Result<PragmaState> {
    let journal_mode: String = conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))?;
    let busy_timeout_ms: u32 = conn.query_row("PRAGMA busy_timeout", [], |row| row.get(0))?;
    let foreign_keys: i32 = conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0))?;
    Ok(PragmaState {
        journal_mode,
        busy_timeout_ms,
        foreign_keys_enabled: foreign_keys == 1,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_applies_pragmas() {
        let conn = open_in_memory(&ConnectionConfig::default()).unwrap();
        let pragmas = verify_pragmas(&conn).unwrap();
        assert_eq!(pragmas.journal_mode, "memory");
        assert_eq!(pragmas.busy_timeout_ms, 5_000);
        assert!(pragmas.foreign_keys_enabled);
    }

    #[test]
    fn file_uses_wal_and_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.db");
        let config = ConnectionConfig {
            busy_timeout_ms: 250,
            foreign_keys: false,
        };
        let conn = open_file(&path, &config, BackendMode::Durable).unwrap();
        let pragmas = verify_pragmas(&conn).unwrap();
        assert_eq!(pragmas.journal_mode, "wal");
        assert_eq!(pragmas.busy_timeout_ms, 250);
        assert!(!pragmas.foreign_keys_enabled);
        assert!(path.exists());
    }

    #[test]
    fn ephemeral_open_keeps_file_journal_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");
        let config = ConnectionConfig::default();
        {
            let conn = open_file(&path, &config, BackendMode::Ephemeral).unwrap();
            conn.execute_batch("CREATE TABLE main.\"Durable\" (\"Id\" INT)").unwrap();
            assert_eq!(verify_pragmas(&conn).unwrap().journal_mode, "delete");
        }
        let conn = Connection::open(&path).unwrap();
        assert_eq!(verify_pragmas(&conn).unwrap().journal_mode, "delete");
    }

    #[test]
    fn config_from_settings() {
        let settings = DatabaseSettings {
            busy_timeout_ms: 42,
            foreign_keys: false,
            ..DatabaseSettings::default()
        };
        let config = ConnectionConfig::from(&settings);
        assert_eq!(config.busy_timeout_ms, 42);
        assert!(!config.foreign_keys);
    }
}
