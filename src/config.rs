//! Application configuration

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::assembler::DEFAULT_RESOURCE_NAMESPACE;
use crate::model::DEFAULT_OFFSET_DAYS;
use crate::source::FileDataSource;

/// Application configuration loaded from environment
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// SQLite database file
    pub database_path: PathBuf,
    /// Directory downloaded data files are written to (read first)
    pub data_dir: PathBuf,
    /// Directory of the bundled data files
    pub assets_dir: PathBuf,

    /// Namespace of generated image references
    pub resource_namespace: String,
    /// Days between source-region and localized release
    pub offset_days: i64,

    /// HTTP server port
    pub server_port: u16,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key → value lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            database_path: PathBuf::from(var("FUTURE_SIGHT_DB", "future_sight.db")),
            data_dir: PathBuf::from(var("FUTURE_SIGHT_DATA_DIR", "data")),
            assets_dir: PathBuf::from(var("FUTURE_SIGHT_ASSETS_DIR", "assets")),

            resource_namespace: var("FUTURE_SIGHT_NAMESPACE", DEFAULT_RESOURCE_NAMESPACE),
            offset_days: var("FUTURE_SIGHT_OFFSET_DAYS", &DEFAULT_OFFSET_DAYS.to_string())
                .trim()
                .parse()
                .context("FUTURE_SIGHT_OFFSET_DAYS must be a whole number of days")?,

            server_port: var("SERVER_PORT", "3000")
                .trim()
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
        })
    }

    /// Data source over the configured directories
    pub fn data_source(&self) -> FileDataSource {
        FileDataSource::new(self.data_dir.clone(), self.assets_dir.clone())
    }
}
