//! CLI argument parsing
//!
//! Grammar:
//! ```text
//! reportfold [--config <path>] [--log-format text|json] <mode> [mode-args]
//!
//! MODES:
//!   merge --old <path> --new <path> [--fragments <path>] [--cluster] [--strict] [--pretty]
//!   parse-key <key> [--prefix <prefix>]
//!   summarize --report <path> [--pretty]
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::{Error, Result};

/// Parsed CLI arguments
#[derive(Debug, Clone, PartialEq, Parser)]
#[command(
    name = "reportfold",
    version,
    about = "Fold policy report change requests into canonical reports"
)]
pub struct Args {
    /// Merge configuration file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log output format on stderr
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub mode: Mode,
}

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// CLI modes
#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Mode {
    /// Merge one change request batch into a previous report
    Merge {
        /// Previous merged report (JSON)
        #[arg(long)]
        old: PathBuf,

        /// Report skeleton carrying the incoming results (JSON)
        #[arg(long)]
        new: PathBuf,

        /// Aggregated change requests (JSON array)
        #[arg(long)]
        fragments: Option<PathBuf>,

        /// Treat the change requests as cluster-scoped
        #[arg(long)]
        cluster: bool,

        /// Drop an old entry if any deletion marker matches it
        #[arg(long)]
        strict: bool,

        /// Pretty-print the merged report
        #[arg(long)]
        pretty: bool,
    },

    /// Parse a deleted policy/rule key
    ParseKey {
        key: String,

        /// Key prefix (defaults to the configured one)
        #[arg(long)]
        prefix: Option<String>,
    },

    /// Recompute the summary of a report
    Summarize {
        #[arg(long)]
        report: PathBuf,

        #[arg(long)]
        pretty: bool,
    },
}

/// Parse CLI arguments (first item is the program name)
pub fn parse_args<I, T>(args: I) -> Result<Args>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Args::try_parse_from(args).map_err(|e| Error::InvalidArgs(e.to_string()))
}
