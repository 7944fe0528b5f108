//! Settings type definitions.
//!
//! All types use camelCase JSON and `#[serde(default)]`, so a settings file
//! only needs the fields it changes.

use hybrid_core::BackendMode;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Smallest accepted busy timeout, in milliseconds.
pub const MIN_BUSY_TIMEOUT_MS: u32 = 1;
/// Largest accepted busy timeout, in milliseconds.
pub const MAX_BUSY_TIMEOUT_MS: u32 = 600_000;

/// Root settings type.
///
/// ```json
/// {
///   "database": { "path": "/var/lib/hybrid/store.db", "mode": "durable" },
///   "logging": { "level": "info" }
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HybridSettings {
    /// Database connection and migration target.
    pub database: DatabaseSettings,
    /// Log output.
    pub logging: LoggingSettings,
}

impl HybridSettings {
    /// Reject values that parse but cannot be used.
    pub fn validate(&self) -> Result<()> {
        let timeout = self.database.busy_timeout_ms;
        if !(MIN_BUSY_TIMEOUT_MS..=MAX_BUSY_TIMEOUT_MS).contains(&timeout) {
            return Err(SettingsError::InvalidValue(format!(
                "database.busyTimeoutMs must be within {MIN_BUSY_TIMEOUT_MS}..={MAX_BUSY_TIMEOUT_MS}, got {timeout}"
            )));
        }
        if self.database.path.as_deref().is_some_and(|p| p.trim().is_empty()) {
            return Err(SettingsError::InvalidValue(
                "database.path must not be blank".into(),
            ));
        }
        Ok(())
    }
}

/// Database settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatabaseSettings {
    /// Database file. `None` opens an in-memory database.
    pub path: Option<String>,
    /// Where migrations place their tables.
    pub mode: BackendMode,
    /// How long to wait on a locked database file.
    pub busy_timeout_ms: u32,
    /// Enforce foreign key constraints.
    pub foreign_keys: bool,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: None,
            mode: BackendMode::Durable,
            busy_timeout_ms: 5_000,
            foreign_keys: true,
        }
    }
}

/// Logging settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_owned(),
        }
    }
}
