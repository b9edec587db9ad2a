//! Runtime configuration

mod loader;

pub use loader::{ConfigLoader, LOCAL_CONFIG_FILE};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Text inserter settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InserterConfig {
    /// JSON file backing the file store
    pub store_path: PathBuf,
    /// How long page notifications stay visible
    pub notification_ms: u64,
    /// How long popup status messages stay before the default line returns
    pub status_reset_ms: u64,
    /// Outline applied to the hovered element during selection
    pub highlight_outline: String,
    /// URL schemes the popup refuses to work on
    pub blocked_schemes: Vec<String>,
}

impl Default for InserterConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            notification_ms: 3000,
            status_reset_ms: 2000,
            highlight_outline: "3px dashed #00A9FF".to_string(),
            blocked_schemes: ["chrome", "about", "chrome-extension", "moz-extension"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl InserterConfig {
    pub fn notification_duration(&self) -> Duration {
        Duration::from_millis(self.notification_ms)
    }

    pub fn status_reset_duration(&self) -> Duration {
        Duration::from_millis(self.status_reset_ms)
    }

    /// Whether pages with this URL scheme are off limits
    pub fn is_blocked_scheme(&self, scheme: &str) -> bool {
        self.blocked_schemes.iter().any(|s| s.eq_ignore_ascii_case(scheme))
    }
}

fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("text-inserter").join("store.json"))
        .unwrap_or_else(|| PathBuf::from("text-inserter-store.json"))
}
