//! Path resolution for pomotrack configuration and data files.
//!
//! All pomotrack data is stored in `~/.pomotrack/` (or `$POMOTRACK_HOME`):
//! - `config.yaml` - Main configuration file
//! - `pomotrack.db` - SQLite database for sessions and tasks

use std::path::PathBuf;

use crate::error::PomotrackError;

/// Environment variable that relocates the data directory.
pub const HOME_ENV: &str = "POMOTRACK_HOME";

/// Paths to pomotrack configuration and data.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Root directory: `~/.pomotrack/`
    pub root: PathBuf,
    /// Config file: `~/.pomotrack/config.yaml`
    pub config_file: PathBuf,
    /// Database file: `~/.pomotrack/pomotrack.db`
    pub database: PathBuf,
}

impl Paths {
    /// Resolve paths from `$POMOTRACK_HOME`, falling back to `~/.pomotrack`.
    ///
    /// # Errors
    ///
    /// Returns an error if neither variable is set.
    pub fn new() -> Result<Self, PomotrackError> {
        if let Some(root) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::with_root(PathBuf::from(root)));
        }

        let home = std::env::var("HOME").map_err(|_| {
            PomotrackError::Config("Could not determine home directory".to_string())
        })?;

        Ok(Self::with_root(PathBuf::from(home).join(".pomotrack")))
    }

    /// Create paths with a custom root directory.
    #[must_use]
    pub fn with_root(root: PathBuf) -> Self {
        Self {
            config_file: root.join("config.yaml"),
            database: root.join("pomotrack.db"),
            root,
        }
    }

    /// Create the root directory if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation fails.
    pub fn ensure_dirs(&self) -> Result<(), PomotrackError> {
        if !self.root.exists() {
            std::fs::create_dir_all(&self.root).map_err(|e| {
                PomotrackError::Config(format!(
                    "Failed to create directory {}: {e}",
                    self.root.display()
                ))
            })?;
        }
        Ok(())
    }
}
