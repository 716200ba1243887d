//! CLI error type.

use std::path::PathBuf;

use thiserror::Error;

use walklog::config::ConfigError;
use walklog::logging::LoggingError;
use walklog::record::StoreError;
use walklog::walk::TrackerError;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Logging setup failed: {0}")]
    Logging(#[from] LoggingError),

    #[error("Cannot read fixes: {0}")]
    Input(String),

    #[error("Tracking failed: {0}")]
    Tracker(#[from] TrackerError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("No walk store at {0}")]
    NoStore(PathBuf),

    #[error("Failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
}
