//! Runtime configuration types.
//!
//! The CLI reads `tenancy.toml` using these types. Every field has a
//! default, so a missing or partial file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Canonical config file name.
pub const CONFIG_FILE_NAME: &str = "tenancy.toml";
/// Database file name inside the data directory.
pub const DB_FILE_NAME: &str = "tenancy.db";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read {path}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("write {path}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parse {path}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("serialize config")]
    Serialize(#[from] toml::ser::Error),
    #[error("could not determine a home directory")]
    NoHome,
}

/// Top-level configuration (persisted as `tenancy.toml`).
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TenancyConfig {
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseSettings {
    /// Database file. Defaults to the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub wal: bool,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: None,
            wal: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSettings {
    /// `tracing_subscriber::EnvFilter` directives; `RUST_LOG` wins when set.
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

impl TenancyConfig {
    /// Database path from config, falling back to the platform default.
    pub fn db_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.database.path {
            Some(path) => Ok(path.clone()),
            None => default_db_path(),
        }
    }
}

// ── Serde default functions ─────────────────────────────────────────────

fn default_true() -> bool {
    true
}
fn default_filter() -> String {
    "warn".to_string()
}

// ── Loading ─────────────────────────────────────────────────────────────

/// Load config from `path`. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<TenancyConfig, ConfigError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(TenancyConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn save_config(path: &Path, config: &TenancyConfig) -> Result<(), ConfigError> {
    let encoded = toml::to_string_pretty(config)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, encoded).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn project_dirs() -> Result<directories::ProjectDirs, ConfigError> {
    directories::ProjectDirs::from("", "", "tenancy").ok_or(ConfigError::NoHome)
}

/// `<config dir>/tenancy/tenancy.toml`
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    Ok(project_dirs()?.config_dir().join(CONFIG_FILE_NAME))
}

/// `<data dir>/tenancy/tenancy.db`
pub fn default_db_path() -> Result<PathBuf, ConfigError> {
    Ok(project_dirs()?.data_dir().join(DB_FILE_NAME))
}
