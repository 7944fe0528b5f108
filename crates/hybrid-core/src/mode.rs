//! Backend mode selector.

use serde::{Deserialize, Serialize};

/// Where a migration batch places its tables.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    /// Permanent tables in the connection's own catalog.
    #[default]
    Durable,
    /// Connection-scoped tables that disappear when the connection closes.
    Ephemeral,
}

impl BackendMode {
    /// Parse a mode name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "durable" | "real" => Some(Self::Durable),
            "ephemeral" | "temp" => Some(Self::Ephemeral),
            _ => None,
        }
    }

    /// Whether tables live only as long as the connection.
    pub const fn is_ephemeral(self) -> bool {
        matches!(self, Self::Ephemeral)
    }
}

impl std::fmt::Display for BackendMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Durable => write!(f, "durable"),
            Self::Ephemeral => write!(f, "ephemeral"),
        }
    }
}
