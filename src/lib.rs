//! ReportFold: canonical policy reports from partial change requests
//!
//! The merge engine lives in `reportfold-core`; this crate adds the
//! command-line front end around it.

pub mod cli;

// Re-export the engine for convenience
pub use reportfold_core as engine;
pub use reportfold_core::{update_results, MergeOutcome, ReportUpdater};
