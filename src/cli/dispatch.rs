//! CLI mode dispatch
//!
//! Dispatches to the mode handlers:
//! - merge: fold a change request batch into a previous report
//! - parse-key: decode a deleted policy/rule key
//! - summarize: recompute a report's summary

use reportfold_core::{
    AggregatedChangeRequests, ClusterReportChangeRequest, DeletedPolicyKey, Document,
    MergeConfig, MergeConfigManager, ReportChangeRequest, ReportUpdater, SeedingMode,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::cli::{Error, Mode, Result, EXIT_FAILURE, EXIT_INPUT_ERROR, EXIT_SUCCESS};

/// Exit code wrapper for CLI operations
pub type ExitCode = i32;

/// Output of the parse-key mode
#[derive(Debug, Serialize)]
struct ParsedKey<'a> {
    policy: &'a str,
    rule: &'a str,
    deleted: bool,
}

/// Load the merge configuration: file (if given), then environment
pub fn load_config(path: Option<&Path>) -> Result<MergeConfig> {
    let manager = match path {
        Some(path) => MergeConfigManager::with_config_file(path),
        None => MergeConfigManager::new(),
    };
    Ok(manager.load()?)
}

/// Run a CLI mode and return its exit code
pub fn run_cli_mode(mode: Mode, config: &MergeConfig) -> ExitCode {
    match run_mode(mode, config) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            exit_code_for(&e)
        }
    }
}

/// Map an error to its exit code
pub fn exit_code_for(error: &Error) -> ExitCode {
    match error {
        Error::Merge(_) | Error::Serialization(_) => EXIT_FAILURE,
        _ => EXIT_INPUT_ERROR,
    }
}

fn run_mode(mode: Mode, config: &MergeConfig) -> Result<()> {
    match mode {
        Mode::Merge {
            old,
            new,
            fragments,
            cluster,
            strict,
            pretty,
        } => run_merge_mode(config, &old, &new, fragments.as_deref(), cluster, strict, pretty),
        Mode::ParseKey { key, prefix } => {
            let prefix = prefix.as_deref().unwrap_or(&config.keys.deleted_policy_prefix);
            run_parse_key_mode(&key, prefix)
        }
        Mode::Summarize { report, pretty } => run_summarize_mode(config, &report, pretty),
    }
}

fn run_merge_mode(
    config: &MergeConfig,
    old: &Path,
    new: &Path,
    fragments: Option<&Path>,
    cluster: bool,
    strict: bool,
    pretty: bool,
) -> Result<()> {
    let old_report = read_document(old)?;
    let new_report = read_document(new)?;

    let requests = match fragments {
        None => AggregatedChangeRequests::default(),
        Some(path) if cluster => {
            AggregatedChangeRequests::Cluster(read_json::<Vec<ClusterReportChangeRequest>>(path)?)
        }
        Some(path) => {
            AggregatedChangeRequests::Namespaced(read_json::<Vec<ReportChangeRequest>>(path)?)
        }
    };
    debug!(change_requests = requests.len(), cluster, "loaded change requests");

    let mode = if strict {
        SeedingMode::Strict
    } else {
        config.seeding_mode
    };
    let updater = ReportUpdater::new(mode, config.keys.clone());
    let outcome = updater.update_results(&old_report, new_report, &requests)?;

    if outcome.duplicate_found {
        warn!(report = %new.display(), "duplicate results found while merging");
    }

    print_json(&outcome.report, pretty)
}

fn run_parse_key_mode(key: &str, prefix: &str) -> Result<()> {
    let parsed = DeletedPolicyKey::parse(key, prefix);
    let output = ParsedKey {
        policy: parsed.map(|p| p.policy).unwrap_or(""),
        rule: parsed.map(|p| p.rule_name()).unwrap_or(""),
        deleted: parsed.is_some(),
    };
    print_json(&output, false)
}

fn run_summarize_mode(config: &MergeConfig, report: &Path, pretty: bool) -> Result<()> {
    let document = read_document(report)?;
    let summary = ReportUpdater::from_config(config).summarize_report(&document)?;
    print_json(&summary, pretty)
}

/// Read a JSON object from disk
fn read_document(path: &Path) -> Result<Document> {
    match read_json::<Value>(path)? {
        Value::Object(document) => Ok(document),
        _ => Err(Error::InvalidInput {
            path: path.to_path_buf(),
            reason: "expected a JSON object".to_string(),
        }),
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: PathBuf::from(path),
        source,
    })?;
    serde_json::from_str(&content).map_err(|e| Error::InvalidInput {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", rendered);
    Ok(())
}
