//! Configuration management for pomotrack.
//!
//! This module handles loading configuration from `~/.pomotrack/`.

mod paths;
mod settings;

pub use paths::{Paths, HOME_ENV};
pub use settings::{Config, GeneralConfig, SyncConfig};
