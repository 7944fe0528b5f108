//! # hybrid-settings
//!
//! Configuration management with layered sources for the hybrid document
//! store.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`HybridSettings::default()`]
//! 2. **User file**: `~/.hybrid/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `HYBRID_*` overrides (highest priority)

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_env_overrides, deep_merge, load_settings, load_settings_from_path, settings_path,
};
pub use types::{DatabaseSettings, HybridSettings, LoggingSettings};
