use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::version::registries::npm::DEFAULT_BASE_URL;

// =============================================================================
// Time-related constants
// =============================================================================

/// Timeout for a single registry request in milliseconds (30 seconds)
pub const FETCH_TIMEOUT_MS: u64 = 30_000;

/// Quiet period after the last change signal before a run starts
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Interval at which polling subscriptions stat the manifest
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

const APP_NAME: &str = env!("CARGO_PKG_NAME");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Top-level configuration file structure
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub settings: Settings,
    pub registry: RegistryConfig,
    pub watch: WatchConfig,
}

/// Settings snapshot consumed by each reconciliation run
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Include `devDependencies` in the run
    pub check_dev_dependencies: bool,
    /// Also consider the `beta` dist-tag after `latest`
    pub use_beta_channel: bool,
    /// Report in-range upgrades
    pub notify_outdated: bool,
    /// Report upgrades that leave the declared range
    pub notify_update: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            check_dev_dependencies: true,
            use_beta_channel: false,
            notify_outdated: true,
            notify_update: true,
        }
    }
}

/// Registry client configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RegistryConfig {
    pub url: String,
    pub timeout_ms: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: FETCH_TIMEOUT_MS,
        }
    }
}

/// Manifest watcher timing
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct WatchConfig {
    pub debounce_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl Config {
    /// Load configuration from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        serde_json::from_str(&content).map_err(|source| ConfigError::Invalid {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Returns the path to the data directory for npm-outdated.
/// Uses $XDG_DATA_HOME/npm-outdated if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/npm-outdated,
/// or ./npm-outdated if neither is available.
pub fn data_dir() -> PathBuf {
    xdg_dir_with_env(
        std::env::var("XDG_DATA_HOME").ok(),
        dirs::home_dir(),
        ".local/share",
    )
}

/// Returns the path to the default config file.
/// Uses $XDG_CONFIG_HOME/npm-outdated/config.json, falling back to ~/.config.
pub fn config_path() -> PathBuf {
    xdg_dir_with_env(
        std::env::var("XDG_CONFIG_HOME").ok(),
        dirs::home_dir(),
        ".config",
    )
    .join("config.json")
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join(format!("{APP_NAME}.log"))
}

fn xdg_dir_with_env(xdg_home: Option<String>, home_dir: Option<PathBuf>, fallback: &str) -> PathBuf {
    let base = xdg_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(fallback)))
        .unwrap_or_else(|| PathBuf::from("."));

    base.join(APP_NAME)
}
