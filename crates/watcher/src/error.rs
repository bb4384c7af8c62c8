//! Error types for the watcher

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the watcher, its configuration, or an event source
#[derive(Debug, Error)]
pub enum WatchError {
    /// Error reported by the underlying filesystem notification service
    #[error("notify error: {0}")]
    Notify(#[from] notify::Error),

    /// The watcher or its event source has been closed
    #[error("watcher is closed")]
    Closed,

    /// `remove` was called for a path that was never added
    #[error("path is not watched: {}", .0.display())]
    NotWatched(PathBuf),

    /// Configuration value out of range
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Configuration file could not be parsed
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Ignore pattern could not be compiled
    #[error("invalid ignore pattern: {0}")]
    Pattern(#[from] ignore::Error),

    /// I/O error (reading configuration files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The watcher was created outside of a tokio runtime
    #[error("no tokio runtime available to run the dispatch loop")]
    NoRuntime,
}

/// Result type for watcher operations
pub type Result<T> = std::result::Result<T, WatchError>;
