//! Configuration file management.
//!
//! Handles loading TOML configuration files and creating the default one.

use std::fs;
use std::path::Path;

use crate::domain::{AppConfig, AppError, Result};

/// Default configuration file content.
const DEFAULT_CONFIG: &str = r#"# hermes-export configuration
# Auto-generated - edit as needed

[exporter]
# External export tool binary (must be on PATH or an absolute path)
binary = "imessage-exporter"

# Output format passed to the tool
format = "txt"

# Attachment compatibility mode passed to the tool
compatibility = "compatible"

[paths]
# Messages database (optional, defaults to ~/Library/Messages/chat.db)
# message_db = "/path/to/chat.db"

# Root directory for reconciled exports (optional)
# conversations_root = "conversations_selected"

# Scratch directory for the export tool's raw output (optional)
# scratch_dir = "/tmp/hermes-export-scratch"
"#;

/// Load configuration from file or create default.
///
/// # Errors
/// Returns error if the file exists but cannot be read or parsed.
pub fn load_config() -> Result<AppConfig> {
    let config_path = AppConfig::config_file_path();

    if config_path.exists() {
        load_config_from_file(&config_path)
    } else {
        Ok(AppConfig::default())
    }
}

/// Load configuration from a specific file.
///
/// # Errors
/// Returns error if the file cannot be read or parsed.
pub fn load_config_from_file(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| AppError::io(format!("Failed to read config file: {}", path.display()), e))?;

    toml::from_str(&content).map_err(|e| AppError::Config {
        message: format!("Failed to parse config file: {e}"),
    })
}

/// Create the default configuration file if it doesn't exist.
///
/// # Errors
/// Returns error if the file cannot be created.
pub fn ensure_config_exists() -> Result<()> {
    let config_path = AppConfig::config_file_path();

    if !config_path.exists() {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::io("Failed to create config directory", e))?;
        }

        fs::write(&config_path, DEFAULT_CONFIG)
            .map_err(|e| AppError::io("Failed to create default config", e))?;

        tracing::info!(path = %config_path.display(), "Created default configuration");
    }

    Ok(())
}
