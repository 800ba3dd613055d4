//! CLI command implementations.

pub mod config;
pub mod list;
pub mod report;
pub mod scan;

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

use rcpt_core::models::config::RcptConfig;
use rcpt_core::SqliteReceiptStore;

/// Output format for receipt data.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rcpt")
        .join("config.json")
}

/// Load configuration from `-c`, else the default file, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<RcptConfig> {
    let path = match config_path {
        Some(path) => PathBuf::from(path),
        None => {
            let path = default_config_path();
            if !path.exists() {
                debug!("No config file, using defaults");
                return Ok(RcptConfig::default());
            }
            path
        }
    };

    RcptConfig::from_file(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))
}

/// Open the receipt store at `--db` or the configured path.
pub fn open_store(db: Option<&Path>, config: &RcptConfig) -> anyhow::Result<SqliteReceiptStore> {
    let path = db
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.storage.database_path.clone());

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    SqliteReceiptStore::open(&path)
        .with_context(|| format!("Failed to open receipt store {}", path.display()))
}
