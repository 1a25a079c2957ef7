//! CLI module
//!
//! Provides:
//! - Argument parsing for the merge, parse-key and summarize modes
//! - Configuration loading (file → environment → validation)
//! - Log subscriber setup
//! - Mode dispatch with deterministic exit codes

pub mod args;
pub mod dispatch;
pub mod logging;

// Re-exports
pub use args::{parse_args, Args, LogFormat, Mode};
pub use dispatch::{load_config, run_cli_mode, ExitCode};
pub use logging::init_logging;

use reportfold_core::{ConfigError, MergeError};
use std::path::PathBuf;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid input in {}: {reason}", .path.display())]
    InvalidInput { path: PathBuf, reason: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Merge failed: {0}")]
    Merge(#[from] MergeError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Exit codes (deterministic)
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_INPUT_ERROR: i32 = 2;

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, Error>;
