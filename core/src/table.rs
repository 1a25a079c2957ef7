//! Result hash table
//!
//! Maps identity keys to the most recently seen raw result entry. A table
//! is built per merge call from the previous report, filtered through the
//! active deletion markers, and then receives the incoming entries.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::errors::{MergeError, Result};
use crate::identity::{derive_key, IdentityKey};
use crate::model::{value_kind, Document, RESULTS_FIELD};
use crate::tombstone::DeletedResource;

/// How deletion markers gate the reseeding of previous entries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedingMode {
    /// Each marker is evaluated separately and an entry is kept as soon as
    /// one marker leaves it alone. With several markers an entry matched by
    /// one of them survives through the others.
    #[default]
    Compatible,
    /// An entry is kept only if no marker suppresses it
    Strict,
}

impl FromStr for SeedingMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compatible" => Ok(SeedingMode::Compatible),
            "strict" => Ok(SeedingMode::Strict),
            _ => Err(format!("unknown seeding mode: {}", s)),
        }
    }
}

impl fmt::Display for SeedingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeedingMode::Compatible => f.write_str("compatible"),
            SeedingMode::Strict => f.write_str("strict"),
        }
    }
}

/// Identity key -> latest raw result entry
#[derive(Debug, Clone, Default)]
pub struct ResultTable {
    entries: HashMap<IdentityKey, Value>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from a report's results, dropping entries that refer
    /// to a deleted resource
    pub fn seed(report: &Document, markers: &[DeletedResource], mode: SeedingMode) -> Result<Self> {
        let mut table = Self::new();

        for result in results_of(report)? {
            let Value::Object(entry) = result else {
                return Err(MergeError::InvalidDocument(format!(
                    "result entry is {}, not a map",
                    value_kind(result)
                )));
            };

            if markers.is_empty() {
                table.insert_entry(entry);
                continue;
            }

            match mode {
                SeedingMode::Compatible => {
                    for marker in markers {
                        if marker.suppresses(entry) {
                            debug!(
                                kind = %marker.kind,
                                name = %marker.name,
                                "suppressed by deletion marker"
                            );
                        } else {
                            table.insert_entry(entry);
                        }
                    }
                }
                SeedingMode::Strict => {
                    if let Some(marker) = markers.iter().find(|marker| marker.suppresses(entry)) {
                        debug!(
                            kind = %marker.kind,
                            name = %marker.name,
                            "suppressed by deletion marker"
                        );
                    } else {
                        table.insert_entry(entry);
                    }
                }
            }
        }

        Ok(table)
    }

    /// Fold incoming entries into the table, last write wins
    ///
    /// Returns true when at least one incoming entry replaced an existing
    /// key. Non-map entries and entries without resources are skipped.
    pub fn merge<'a, I>(&mut self, entries: I) -> bool
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let mut duplicate_found = false;

        for result in entries {
            let Some(entry) = result.as_object() else {
                debug!("skipping incoming result that is not a map");
                continue;
            };
            let Some(key) = derive_key(entry) else {
                debug!("skipping incoming result without resources");
                continue;
            };

            if self.entries.insert(key.clone(), result.clone()).is_some() {
                debug!(key = %key, "incoming result replaces an existing entry");
                duplicate_found = true;
            }
        }

        duplicate_found
    }

    /// Consume the table into its entries, in no particular order
    pub fn extract(self) -> Vec<Value> {
        self.entries.into_values().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &IdentityKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &IdentityKey) -> Option<&Value> {
        self.entries.get(key)
    }

    fn insert_entry(&mut self, entry: &Map<String, Value>) {
        if let Some(key) = derive_key(entry) {
            self.entries.insert(key, Value::Object(entry.clone()));
        }
    }
}

/// The `results` sequence of a report; absent or null means empty
pub(crate) fn results_of(report: &Document) -> Result<&[Value]> {
    match report.get(RESULTS_FIELD) {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(results)) => Ok(results),
        Some(other) => Err(MergeError::InvalidDocument(format!(
            "'{}' is {}, not a sequence",
            RESULTS_FIELD,
            value_kind(other)
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result(policy: &str, kind: &str, namespace: &str, name: &str, status: &str) -> Value {
        json!({
            "policy": policy,
            "rule": "rule",
            "result": status,
            "resources": [{"kind": kind, "namespace": namespace, "name": name}]
        })
    }

    fn report(results: Vec<Value>) -> Document {
        let mut doc = Document::new();
        doc.insert(RESULTS_FIELD.to_string(), Value::Array(results));
        doc
    }

    #[test]
    fn test_seed_without_markers_keeps_every_keyed_entry() {
        let doc = report(vec![
            result("p1", "Pod", "x", "a", "pass"),
            result("p2", "Pod", "x", "a", "fail"),
            json!({"policy": "p3", "rule": "r", "resources": []}),
        ]);

        let table = ResultTable::seed(&doc, &[], SeedingMode::Compatible).unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_seed_drops_suppressed_entries() {
        let doc = report(vec![
            result("p1", "Pod", "x", "y", "pass"),
            result("p1", "Pod", "x", "z", "pass"),
        ]);
        let markers = [DeletedResource::new("Pod", "x", "y")];

        let table = ResultTable::seed(&doc, &markers, SeedingMode::Compatible).unwrap();
        assert_eq!(table.len(), 1);
        let remaining = table.extract();
        assert_eq!(remaining[0]["resources"][0]["name"], json!("z"));
    }

    #[test]
    fn test_seed_modes_differ_with_several_markers() {
        let doc = report(vec![result("p1", "Pod", "x", "y", "pass")]);
        let markers = [
            DeletedResource::new("Pod", "x", "y"),
            DeletedResource::new("Pod", "x", "other"),
        ];

        let compatible = ResultTable::seed(&doc, &markers, SeedingMode::Compatible).unwrap();
        assert_eq!(compatible.len(), 1);

        let strict = ResultTable::seed(&doc, &markers, SeedingMode::Strict).unwrap();
        assert!(strict.is_empty());
    }

    #[test]
    fn test_seed_missing_or_null_results() {
        assert!(ResultTable::seed(&Document::new(), &[], SeedingMode::Compatible)
            .unwrap()
            .is_empty());

        let mut doc = Document::new();
        doc.insert(RESULTS_FIELD.to_string(), Value::Null);
        assert!(ResultTable::seed(&doc, &[], SeedingMode::Strict).unwrap().is_empty());
    }

    #[test]
    fn test_seed_rejects_malformed_results() {
        let mut doc = Document::new();
        doc.insert(RESULTS_FIELD.to_string(), json!("nope"));
        assert!(matches!(
            ResultTable::seed(&doc, &[], SeedingMode::Compatible),
            Err(MergeError::InvalidDocument(_))
        ));

        let doc = report(vec![json!(42)]);
        assert!(matches!(
            ResultTable::seed(&doc, &[], SeedingMode::Compatible),
            Err(MergeError::InvalidDocument(_))
        ));
    }

    #[test]
    fn test_merge_flags_duplicates_and_overwrites() {
        let mut table = ResultTable::new();
        let first = [result("p1", "Pod", "x", "y", "fail")];
        assert!(!table.merge(first.iter()));

        let second = [
            result("p1", "Pod", "x", "y", "pass"),
            result("p1", "Pod", "x", "z", "pass"),
        ];
        assert!(table.merge(second.iter()));
        assert_eq!(table.len(), 2);

        let key = IdentityKey::compose("p1", "rule", "Pod", "x", "y");
        assert_eq!(table.get(&key).unwrap()["result"], json!("pass"));
    }

    #[test]
    fn test_merge_last_delivery_wins_within_one_batch() {
        let mut table = ResultTable::new();
        let batch = [
            result("p1", "Pod", "x", "y", "fail"),
            result("p1", "Pod", "x", "y", "warn"),
        ];
        assert!(table.merge(batch.iter()));

        let key = IdentityKey::compose("p1", "rule", "Pod", "x", "y");
        assert!(table.contains_key(&key));
        assert_eq!(table.get(&key).unwrap()["result"], json!("warn"));
    }

    #[test]
    fn test_merge_skips_degenerate_and_non_map_entries() {
        let mut table = ResultTable::new();
        let degenerate = json!({"policy": "p1", "rule": "rule", "resources": []});
        let batch = [degenerate.clone(), json!("garbage"), degenerate];

        assert!(!table.merge(batch.iter()));
        assert!(table.is_empty());
    }

    #[test]
    fn test_seeding_mode_parsing() {
        assert_eq!("STRICT".parse::<SeedingMode>().unwrap(), SeedingMode::Strict);
        assert_eq!("compatible".parse::<SeedingMode>().unwrap(), SeedingMode::Compatible);
        assert!("lenient".parse::<SeedingMode>().is_err());
        assert_eq!(SeedingMode::Strict.to_string(), "strict");
    }
}
