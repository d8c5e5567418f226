//! Configuration types for hermes-export.
//!
//! Describes where the Messages database lives, where exports land, and how
//! the external export tool is invoked.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration for the external export tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// Name or path of the export tool binary.
    #[serde(default = "default_binary")]
    pub binary: String,

    /// Output format passed to the tool (`-f`).
    #[serde(default = "default_format")]
    pub format: String,

    /// Attachment compatibility mode passed to the tool (`-c`).
    #[serde(default = "default_compatibility")]
    pub compatibility: String,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            format: default_format(),
            compatibility: default_compatibility(),
        }
    }
}

fn default_binary() -> String {
    "imessage-exporter".to_string()
}

fn default_format() -> String {
    "txt".to_string()
}

fn default_compatibility() -> String {
    "compatible".to_string()
}

/// Path configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathConfig {
    /// Messages database path (defaults to `~/Library/Messages/chat.db`).
    #[serde(default)]
    pub message_db: Option<PathBuf>,

    /// Root directory for reconciled per-chat exports.
    #[serde(default)]
    pub conversations_root: Option<PathBuf>,

    /// Scratch directory handed to the export tool.
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// External export tool configuration.
    #[serde(default)]
    pub exporter: ExporterConfig,

    /// Path configuration.
    #[serde(default)]
    pub paths: PathConfig,
}

impl AppConfig {
    /// Effective Messages database path.
    #[must_use]
    pub fn message_db_path(&self) -> PathBuf {
        self.paths.message_db.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("Library/Messages/chat.db")
        })
    }

    /// Effective root directory for reconciled exports.
    #[must_use]
    pub fn conversations_root(&self) -> PathBuf {
        self.paths
            .conversations_root
            .clone()
            .unwrap_or_else(|| PathBuf::from("conversations_selected"))
    }

    /// Effective scratch directory for the export tool's raw output.
    #[must_use]
    pub fn scratch_dir(&self) -> PathBuf {
        self.paths
            .scratch_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("hermes-export-scratch"))
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".hermes-export")
    }

    /// Get the config file path.
    #[must_use]
    pub fn config_file_path() -> PathBuf {
        Self::default_data_dir().join("config.toml")
    }
}
