//! Report data model
//!
//! Reports are handled as semi-structured JSON maps ([`Document`]) at the
//! boundary so that fields this crate does not know about survive a merge
//! untouched. Result entries are reinterpreted as typed [`ResultEntry`]
//! values once the merged list has been extracted.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::errors::{MergeError, Result};

/// A report document: an open JSON object
pub type Document = Map<String, Value>;

/// Field holding the result entries of a report
pub const RESULTS_FIELD: &str = "results";
/// Field holding the status summary of a report
pub const SUMMARY_FIELD: &str = "summary";

/// Read a field where `null` means the same as absent
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Reference to the subject a result was computed against
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceRef {
    #[serde(default, deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub namespace: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Any other reference fields (apiVersion, uid, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResourceRef {
    pub fn new(kind: &str, namespace: &str, name: &str) -> Self {
        Self {
            kind: kind.to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
            extra: Map::new(),
        }
    }
}

/// Outcome of evaluating one rule against one resource
///
/// Unknown status strings are kept as [`Status::Other`] rather than
/// rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    Pass,
    Fail,
    Warn,
    Error,
    Skip,
    Other(String),
}

impl Default for Status {
    fn default() -> Self {
        Status::Other(String::new())
    }
}

impl Status {
    pub fn as_str(&self) -> &str {
        match self {
            Status::Pass => "pass",
            Status::Fail => "fail",
            Status::Warn => "warn",
            Status::Error => "error",
            Status::Skip => "skip",
            Status::Other(s) => s,
        }
    }
}

impl From<String> for Status {
    fn from(value: String) -> Self {
        match value.as_str() {
            "pass" => Status::Pass,
            "fail" => Status::Fail,
            "warn" => Status::Warn,
            "error" => Status::Error,
            "skip" => Status::Skip,
            _ => Status::Other(value),
        }
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed view of one entry in a report's `results` list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub policy: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rule: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub result: Status,
    #[serde(default, deserialize_with = "null_as_default")]
    pub resources: Vec<ResourceRef>,
    /// Message, severity, timestamps and anything else carried along
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResultEntry {
    pub fn new(policy: &str, rule: &str, result: Status, resources: Vec<ResourceRef>) -> Self {
        Self {
            policy: policy.to_string(),
            rule: rule.to_string(),
            result,
            resources,
            extra: Map::new(),
        }
    }

    /// Reinterpret a raw result entry
    pub fn from_value(value: &Value) -> Result<Self> {
        Ok(ResultEntry::deserialize(value)?)
    }

    /// Convert back into a raw result entry
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Aggregate counts of result entries per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    #[serde(default)]
    pub pass: u64,
    #[serde(default)]
    pub fail: u64,
    #[serde(default)]
    pub warn: u64,
    #[serde(default)]
    pub error: u64,
    #[serde(default)]
    pub skip: u64,
}

impl Summary {
    /// Sum of all counters
    pub fn total(&self) -> u64 {
        self.pass + self.fail + self.warn + self.error + self.skip
    }

    /// Document form written under a report's `summary` field
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("pass".to_string(), Value::from(self.pass));
        map.insert("fail".to_string(), Value::from(self.fail));
        map.insert("warn".to_string(), Value::from(self.warn));
        map.insert("error".to_string(), Value::from(self.error));
        map.insert("skip".to_string(), Value::from(self.skip));
        map
    }
}

/// Set `value` at `path` inside `document`, creating intermediate maps
///
/// Fails when an intermediate field exists but is not a map.
pub fn set_nested_field(document: &mut Document, value: Value, path: &[&str]) -> Result<()> {
    let Some((last, parents)) = path.split_last() else {
        return Err(MergeError::DocumentWrite {
            field: String::new(),
            reason: "empty field path".to_string(),
        });
    };

    let mut current = document;
    for (depth, segment) in parents.iter().enumerate() {
        let slot = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        current = match slot {
            Value::Object(map) => map,
            other => {
                return Err(MergeError::DocumentWrite {
                    field: path.join("."),
                    reason: format!(
                        "'{}' is {}, not a map",
                        path[..=depth].join("."),
                        value_kind(other)
                    ),
                })
            }
        };
    }

    current.insert(last.to_string(), value);
    Ok(())
}

/// Short name of a JSON value's type for error messages
pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a bool",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a map",
    }
}
