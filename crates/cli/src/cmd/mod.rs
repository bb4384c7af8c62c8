//! CLI command implementations

pub mod config;
pub mod watch;

use anyhow::{Context, Result};
use std::path::Path;
use watcher::WatcherConfig;

/// Load the configuration file if one was given, defaults otherwise
pub fn load_config(path: Option<&Path>) -> Result<WatcherConfig> {
    match path {
        Some(path) => WatcherConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(WatcherConfig::default()),
    }
}
