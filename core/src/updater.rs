//! Report updater
//!
//! Entry point of a merge cycle: derive deletion markers from the
//! aggregated change requests, reseed from the previous report, fold in the
//! new results, then write the deduplicated results and a fresh summary into
//! the outgoing report.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::change_request::AggregatedChangeRequests;
use crate::config::MergeConfig;
use crate::errors::Result;
use crate::model::{set_nested_field, Document, ResultEntry, Summary, RESULTS_FIELD, SUMMARY_FIELD};
use crate::summary::summarize;
use crate::table::{results_of, ResultTable, SeedingMode};
use crate::tombstone::MetadataKeys;

/// Result of one merge cycle
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    /// The merged report
    pub report: Document,
    /// Whether an incoming entry replaced an existing one
    pub duplicate_found: bool,
    /// The summary written into `report`
    pub summary: Summary,
}

/// Merges change request batches into reports
#[derive(Debug, Clone, Default)]
pub struct ReportUpdater {
    mode: SeedingMode,
    keys: MetadataKeys,
}

impl ReportUpdater {
    pub fn new(mode: SeedingMode, keys: MetadataKeys) -> Self {
        Self { mode, keys }
    }

    pub fn from_config(config: &MergeConfig) -> Self {
        Self::new(config.seeding_mode, config.keys.clone())
    }

    pub fn mode(&self) -> SeedingMode {
        self.mode
    }

    pub fn keys(&self) -> &MetadataKeys {
        &self.keys
    }

    /// Fold `new_report`'s results into `old_report`'s
    ///
    /// `new_report` provides the entries to add and is the document that
    /// comes back, with `results` and `summary` replaced. Nothing else in it
    /// is touched.
    pub fn update_results(
        &self,
        old_report: &Document,
        new_report: Document,
        requests: &AggregatedChangeRequests,
    ) -> Result<MergeOutcome> {
        let markers = requests.deleted_resources(&self.keys);
        if !markers.is_empty() {
            debug!(markers = markers.len(), mode = %self.mode, "applying deletion markers");
        }

        let mut table = ResultTable::seed(old_report, &markers, self.mode)?;
        let seeded = table.len();

        let duplicate_found = match new_report.get(RESULTS_FIELD) {
            Some(Value::Array(incoming)) => table.merge(incoming),
            _ => false,
        };
        if duplicate_found {
            warn!("incoming results replaced existing entries with the same identity");
        }

        let results = table.extract();
        let typed = results
            .iter()
            .map(ResultEntry::from_value)
            .collect::<Result<Vec<_>>>()?;
        let summary = summarize(&typed);

        let count = results.len();
        let mut report = new_report;
        set_nested_field(&mut report, Value::Array(results), &[RESULTS_FIELD])?;

        set_nested_field(&mut report, Value::Object(summary.to_map()), &[SUMMARY_FIELD])?;

        info!(
            seeded,
            results = count,
            pass = summary.pass,
            fail = summary.fail,
            duplicate_found,
            "merged report results"
        );

        Ok(MergeOutcome {
            report,
            duplicate_found,
            summary,
        })
    }

    /// Recompute the summary of an existing report
    pub fn summarize_report(&self, report: &Document) -> Result<Summary> {
        let typed = results_of(report)?
            .iter()
            .map(ResultEntry::from_value)
            .collect::<Result<Vec<_>>>()?;
        Ok(summarize(&typed))
    }
}

/// Merge with the default configuration
pub fn update_results(
    old_report: &Document,
    new_report: Document,
    requests: &AggregatedChangeRequests,
) -> Result<MergeOutcome> {
    ReportUpdater::default().update_results(old_report, new_report, requests)
}
