use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ecowitt_core::{DEFAULT_WIND_OFFSET, UnknownFieldPolicy};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid table name {0:?}")]
    InvalidTable(String),
    #[error("report path {0:?} must start with '/'")]
    InvalidReportPath(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Used when `RUST_LOG` is not set.
    pub log_level: String,
    pub server: ServerConfig,
    pub station: StationConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub http_addr: SocketAddr,
    /// Path the station is configured to upload to.
    pub report_path: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    /// Degrees added to every reported wind direction.
    pub wind_direction_offset: i64,
    pub unknown_fields: UnknownFieldPolicy,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub table: String,
    pub write_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Sqlite { path: PathBuf },
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        contents.parse()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if !is_identifier(&self.storage.table) {
            return Err(ConfigError::InvalidTable(self.storage.table));
        }

        if !self.server.report_path.starts_with('/') {
            return Err(ConfigError::InvalidReportPath(self.server.report_path));
        }

        Ok(self)
    }
}

impl std::str::FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: Config = toml::from_str(s)?;
        config.validate()
    }
}

impl StorageConfig {
    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }
}

/// The table name is spliced into SQL, so only plain identifiers pass.
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            server: ServerConfig::default(),
            station: StationConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            report_path: "/data/report/".to_string(),
        }
    }
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            wind_direction_offset: DEFAULT_WIND_OFFSET,
            unknown_fields: UnknownFieldPolicy::Reject,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            table: "weather".to_string(),
            write_timeout_secs: 20,
        }
    }
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::Sqlite {
            path: PathBuf::from("ecowitt.db"),
        }
    }
}
