//! Device configuration
//!
//! Plain settings for opening a controller, loadable from JSON.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::protocol::{
    DEFAULT_BAUD_RATE, DEFAULT_MAX_LOG_LENGTH, DEFAULT_MIN_QUERY_INTERVAL_MS, DEFAULT_TIMEOUT_MS,
};

/// Errors loading a configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Controller configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Serial port name (e.g., "/dev/ttyUSB0" or "COM3")
    pub port_name: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Read timeout in milliseconds; `None` waits forever
    pub timeout_ms: Option<u64>,
    /// Minimal time between the end of a query and the start of the next
    pub min_query_interval_ms: u64,
    /// Number of entries kept in the communication log
    pub max_log_length: usize,
    /// Save to non-volatile memory after every successful set.
    /// Wears out the controller's flash; keep disabled unless needed.
    pub auto_save: bool,
    /// Optional file mirroring the communication log as JSON lines
    pub log_file: Option<PathBuf>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            port_name: "/dev/ttyUSB0".to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout_ms: Some(DEFAULT_TIMEOUT_MS),
            min_query_interval_ms: DEFAULT_MIN_QUERY_INTERVAL_MS,
            max_log_length: DEFAULT_MAX_LOG_LENGTH,
            auto_save: false,
            log_file: None,
        }
    }
}

impl DeviceConfig {
    /// Default configuration for a port
    pub fn for_port(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            ..Self::default()
        }
    }

    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Read timeout as a duration
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Minimal query interval as a duration
    pub fn min_query_interval(&self) -> Duration {
        Duration::from_millis(self.min_query_interval_ms)
    }
}
