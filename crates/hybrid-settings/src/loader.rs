//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`HybridSettings::default()`]
//! 2. If `~/.hybrid/settings.json` exists, deep-merge its values over defaults
//! 3. Apply `HYBRID_*` environment variable overrides (highest priority)
//! 4. Validate the result
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use hybrid_core::BackendMode;
use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::{HybridSettings, MAX_BUSY_TIMEOUT_MS, MIN_BUSY_TIMEOUT_MS};

/// Database file override.
pub const ENV_DB_PATH: &str = "HYBRID_DB_PATH";
/// Backend mode override (`durable` or `ephemeral`).
pub const ENV_BACKEND_MODE: &str = "HYBRID_BACKEND_MODE";
/// Busy timeout override in milliseconds.
pub const ENV_BUSY_TIMEOUT_MS: &str = "HYBRID_BUSY_TIMEOUT_MS";
/// Foreign key enforcement override.
pub const ENV_FOREIGN_KEYS: &str = "HYBRID_FOREIGN_KEYS";
/// Log level override.
pub const ENV_LOG_LEVEL: &str = "HYBRID_LOG_LEVEL";

/// Resolve the path to the settings file (`~/.hybrid/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".hybrid").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<HybridSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults; invalid JSON is an error.
pub fn load_settings_from_path(path: &Path) -> Result<HybridSettings> {
    load_with(path, |key| std::env::var(key).ok())
}

/// Load settings from `path`, reading overrides through `lookup`.
pub fn load_with(path: &Path, lookup: impl Fn(&str) -> Option<String>) -> Result<HybridSettings> {
    let defaults = serde_json::to_value(HybridSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: HybridSettings = serde_json::from_value(merged)?;
    apply_overrides(&mut settings, lookup);
    settings.validate()?;
    Ok(settings)
}

/// Overlay `source` onto `target`, recursing into objects.
pub fn deep_merge(mut target: Value, source: Value) -> Value {
    overlay(&mut target, source);
    target
}

fn overlay(target: &mut Value, source: Value) {
    match (target, source) {
        (_, Value::Null) => {}
        (Value::Object(into), Value::Object(from)) => {
            for (key, value) in from {
                match into.get_mut(&key) {
                    Some(slot) => overlay(slot, value),
                    None if value.is_null() => {}
                    None => {
                        let _ = into.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Apply `HYBRID_*` environment variable overrides.
pub fn apply_env_overrides(settings: &mut HybridSettings) {
    apply_overrides(settings, |key| std::env::var(key).ok());
}

/// Apply overrides read through `lookup`.
///
/// Invalid values are ignored with a warning, keeping the file/default value.
pub fn apply_overrides(settings: &mut HybridSettings, lookup: impl Fn(&str) -> Option<String>) {
    let read = |key: &str| lookup(key).filter(|v| !v.is_empty());

    if let Some(v) = read(ENV_DB_PATH) {
        settings.database.path = Some(v);
    }
    if let Some(v) = read(ENV_BACKEND_MODE) {
        match BackendMode::from_name(&v) {
            Some(mode) => settings.database.mode = mode,
            None => warn_invalid(ENV_BACKEND_MODE, &v, "backend mode"),
        }
    }
    if let Some(v) = read(ENV_BUSY_TIMEOUT_MS) {
        match parse_u32_range(&v, MIN_BUSY_TIMEOUT_MS, MAX_BUSY_TIMEOUT_MS) {
            Some(ms) => settings.database.busy_timeout_ms = ms,
            None => warn_invalid(ENV_BUSY_TIMEOUT_MS, &v, "u32"),
        }
    }
    if let Some(v) = read(ENV_FOREIGN_KEYS) {
        match parse_bool(&v) {
            Some(b) => settings.database.foreign_keys = b,
            None => warn_invalid(ENV_FOREIGN_KEYS, &v, "boolean"),
        }
    }
    if let Some(v) = read(ENV_LOG_LEVEL) {
        settings.logging.level = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u32` within an inclusive range.
pub fn parse_u32_range(val: &str, min: u32, max: u32) -> Option<u32> {
    let n: u32 = val.parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

fn warn_invalid(key: &str, value: &str, expected: &str) {
    tracing::warn!(key, value, expected, "invalid env var, ignoring");
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
