//! Configuration settings for pomotrack.
//!
//! Settings are loaded from `~/.pomotrack/config.yaml`. Every field has a
//! default, so a missing file or a partial file is fine.

use serde::Deserialize;

use crate::cli::args::{OutputFormat, SyncBackend};
use crate::config::Paths;
use crate::error::PomotrackError;
use crate::sync::{DEFAULT_ENDPOINT_SUFFIX, DEFAULT_OBJECT_NAME};

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// General settings.
    pub general: GeneralConfig,
    /// Remote sync settings.
    pub sync: SyncConfig,
}

/// General application settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Default output format.
    pub default_output: OutputFormat,
    /// Log filter used when neither `RUST_LOG` nor `--verbose` is given.
    pub log_level: String,
}

/// Sync settings.
///
/// The account key is deliberately absent; it only comes from the command
/// line or the environment.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Which remote to use when `--backend` is not given.
    pub backend: SyncBackend,
    /// Object name inside the container.
    pub object_name: String,
    /// Default storage account.
    pub account_name: Option<String>,
    /// Default container.
    pub container_name: Option<String>,
    /// Root folder for the `dir` backend.
    pub directory: Option<String>,
    /// Per-request timeout for the Azure backend.
    pub timeout_secs: u64,
    /// Blob endpoint host suffix.
    pub endpoint_suffix: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_output: OutputFormat::Pretty,
            log_level: "warn".to_string(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            backend: SyncBackend::Azure,
            object_name: DEFAULT_OBJECT_NAME.to_string(),
            account_name: None,
            container_name: None,
            directory: None,
            timeout_secs: 30,
            endpoint_suffix: DEFAULT_ENDPOINT_SUFFIX.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self, PomotrackError> {
        let paths = Paths::new()?;
        Self::load_from_path(&paths.config_file)
    }

    /// Load configuration from a specific path.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load_from_path(path: &std::path::Path) -> Result<Self, PomotrackError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            PomotrackError::Config(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;

        // An empty file parses as YAML null
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&contents).map_err(|e| {
            PomotrackError::Config(format!(
                "Failed to parse config file {}: {e}",
                path.display()
            ))
        })
    }
}
