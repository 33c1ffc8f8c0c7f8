//! Configuration loading and management.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default port for the HTTP API.
pub const DEFAULT_PORT: u16 = 8080;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub assignment: AssignmentConfig,
}

/// Server-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Port for the HTTP API.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            port: default_port(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from(".workboard/workboard.db")
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Assignment recommendation tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentConfig {
    /// Maximum load surplus (over the least-loaded employee) at which a
    /// parent task's performer is still recommended for the sub-task.
    #[serde(default = "default_reassign_threshold")]
    pub reassign_threshold: i64,
}

impl Default for AssignmentConfig {
    fn default() -> Self {
        Self {
            reassign_threshold: default_reassign_threshold(),
        }
    }
}

fn default_reassign_threshold() -> i64 {
    2
}

impl Config {
    /// Load configuration from file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from the default location or return defaults,
    /// with environment variable overrides.
    pub fn load_or_default() -> Self {
        let mut config = Self::load(".workboard/config.yaml").unwrap_or_default();

        if let Ok(db_path) = std::env::var("WORKBOARD_DB_PATH") {
            config.server.db_path = PathBuf::from(db_path);
        }

        if let Ok(port) = std::env::var("WORKBOARD_PORT") {
            if let Ok(port) = port.parse() {
                config.server.port = port;
            }
        }

        if let Ok(threshold) = std::env::var("WORKBOARD_REASSIGN_THRESHOLD") {
            if let Ok(threshold) = threshold.parse() {
                config.assignment.reassign_threshold = threshold;
            }
        }

        config
    }

    /// Ensure the database directory exists.
    pub fn ensure_db_dir(&self) -> Result<()> {
        if let Some(parent) = self.server.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}
