//! ReportFold CLI
//!
//! Reads JSON documents from disk, runs one merge mode and prints the
//! result on stdout. Exit codes:
//! - 0: success
//! - 1: merge failure
//! - 2: unreadable input or configuration

use anyhow::Result;
use clap::Parser;

use reportfold::cli::{init_logging, load_config, run_cli_mode, Args, EXIT_INPUT_ERROR};

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(EXIT_INPUT_ERROR);
        }
    };

    init_logging(&config.log_level, args.log_format)?;
    tracing::debug!(seeding_mode = %config.seeding_mode, "configuration loaded");

    let exit_code = run_cli_mode(args.mode, &config);
    std::process::exit(exit_code);
}
