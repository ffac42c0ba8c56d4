//! Configuration loading and root folder resolution

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "TUNEDESK_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "tunedesk.db";

/// TOML configuration file contents
///
/// Every section is optional; missing values fall back to compiled defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Root folder holding the database and the object bucket
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Catalog service settings
    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Catalog service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Address the HTTP API binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Port the HTTP API listens on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bucket directory name under the root folder
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Base URL under which bucket objects are publicly reachable
    #[serde(default)]
    pub public_base_url: Option<String>,

    /// Decode budget for freshly selected local files (milliseconds)
    #[serde(default = "default_upload_decode_ms")]
    pub upload_decode_timeout_ms: u64,

    /// Decode budget for stored assets during a correction pass (milliseconds)
    #[serde(default = "default_stored_decode_ms")]
    pub stored_decode_timeout_ms: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            bucket: default_bucket(),
            public_base_url: None,
            upload_decode_timeout_ms: default_upload_decode_ms(),
            stored_decode_timeout_ms: default_stored_decode_ms(),
        }
    }
}

impl CatalogConfig {
    /// Decode budget for a freshly selected local file
    pub fn upload_decode_timeout(&self) -> Duration {
        Duration::from_millis(self.upload_decode_timeout_ms)
    }

    /// Decode budget for a stored asset
    pub fn stored_decode_timeout(&self) -> Duration {
        Duration::from_millis(self.stored_decode_timeout_ms)
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5810
}

fn default_bucket() -> String {
    "music".to_string()
}

fn default_upload_decode_ms() -> u64 {
    5_000
}

fn default_stored_decode_ms() -> u64 {
    10_000
}

/// Load TOML configuration from an explicit path
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Load TOML configuration from the platform config file, or defaults if absent
pub fn load_default_toml_config() -> TomlConfig {
    match default_config_path() {
        Some(path) if path.exists() => match load_toml_config(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable config file");
                TomlConfig::default()
            }
        },
        _ => TomlConfig::default(),
    }
}

/// Platform config file path (`<config_dir>/tunedesk/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tunedesk").join("config.toml"))
}

/// Root folder resolution priority:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&Path>, toml_config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &toml_config.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("tunedesk"))
        .unwrap_or_else(|| PathBuf::from("./tunedesk_data"))
}

/// Create the root folder if missing and return the database path inside it
pub fn ensure_root_folder(root: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(root)?;
    Ok(root.join(DATABASE_FILE))
}
