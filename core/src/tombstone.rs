//! Deletion markers
//!
//! A change request announces that a resource was deleted through two
//! annotations (kind and name) and a namespace label. Result entries that
//! still point at the deleted resource are dropped when the previous report
//! is reseeded.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::identity::primary_resource;
use crate::model::ResultEntry;

pub const DEFAULT_RESOURCE_KIND_ANNOTATION: &str = "kyverno.io/delete.resource.kind";
pub const DEFAULT_RESOURCE_NAME_ANNOTATION: &str = "kyverno.io/delete.resource.name";
pub const DEFAULT_NAMESPACE_LABEL: &str = "kyverno.io/resource.namespace";
pub const DEFAULT_DELETED_POLICY_PREFIX: &str = "deletedpolicy";

/// Kind whose deletion matches resources by name alone
pub const NAMESPACE_KIND: &str = "Namespace";

/// Well-known metadata keys that carry deletion information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataKeys {
    /// Annotation holding the deleted resource's kind
    pub resource_kind_annotation: String,
    /// Annotation holding the deleted resource's name
    pub resource_name_annotation: String,
    /// Label holding the deleted resource's namespace
    pub namespace_label: String,
    /// First segment of policy/rule deletion keys
    pub deleted_policy_prefix: String,
}

impl Default for MetadataKeys {
    fn default() -> Self {
        Self {
            resource_kind_annotation: DEFAULT_RESOURCE_KIND_ANNOTATION.to_string(),
            resource_name_annotation: DEFAULT_RESOURCE_NAME_ANNOTATION.to_string(),
            namespace_label: DEFAULT_NAMESPACE_LABEL.to_string(),
            deleted_policy_prefix: DEFAULT_DELETED_POLICY_PREFIX.to_string(),
        }
    }
}

/// A resource announced as deleted by a change request
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DeletedResource {
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl DeletedResource {
    pub fn new(kind: &str, namespace: &str, name: &str) -> Self {
        Self {
            kind: kind.to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    /// Build a marker from change request metadata
    ///
    /// Both annotations must be present. A missing namespace label leaves
    /// the namespace empty.
    pub fn from_metadata(
        labels: &BTreeMap<String, String>,
        annotations: &BTreeMap<String, String>,
        keys: &MetadataKeys,
    ) -> Option<Self> {
        let kind = annotations.get(&keys.resource_kind_annotation)?;
        let name = annotations.get(&keys.resource_name_annotation)?;
        let namespace = labels
            .get(&keys.namespace_label)
            .cloned()
            .unwrap_or_default();

        Some(Self {
            kind: kind.clone(),
            namespace,
            name: name.clone(),
        })
    }

    /// The zero marker suppresses nothing
    pub fn is_zero(&self) -> bool {
        self.kind.is_empty() && self.namespace.is_empty() && self.name.is_empty()
    }

    /// Whether a raw result entry refers to this deleted resource
    ///
    /// Kinds must match. Then either name and namespace match, or the
    /// deleted kind is `Namespace` and the names match.
    pub fn suppresses(&self, entry: &Map<String, Value>) -> bool {
        if self.is_zero() {
            return false;
        }
        let Some(resource) = primary_resource(entry) else {
            return false;
        };

        // absent fields compare as empty, non-string fields never match
        let text = |field: &str| match resource.get(field) {
            None | Some(Value::Null) => Some(""),
            Some(value) => value.as_str(),
        };
        self.matches(text("kind"), text("namespace"), text("name"))
    }

    /// Typed counterpart of [`DeletedResource::suppresses`]
    pub fn suppresses_entry(&self, entry: &ResultEntry) -> bool {
        if self.is_zero() {
            return false;
        }
        match entry.resources.first() {
            Some(resource) => self.matches(
                Some(resource.kind.as_str()),
                Some(resource.namespace.as_str()),
                Some(resource.name.as_str()),
            ),
            None => false,
        }
    }

    fn matches(&self, kind: Option<&str>, namespace: Option<&str>, name: Option<&str>) -> bool {
        if kind != Some(self.kind.as_str()) {
            return false;
        }
        let same_name = name == Some(self.name.as_str());
        if same_name && namespace == Some(self.namespace.as_str()) {
            return true;
        }
        self.kind == NAMESPACE_KIND && same_name
    }
}

/// A policy or rule deletion encoded as a map key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletedPolicyKey<'a> {
    pub policy: &'a str,
    /// `None` when the whole policy was deleted
    pub rule: Option<&'a str>,
}

impl<'a> DeletedPolicyKey<'a> {
    /// Parse `<prefix>/<policy>/<rule>` or `<prefix>/<policy>`
    pub fn parse(key: &'a str, prefix: &str) -> Option<Self> {
        let segments: Vec<&str> = key.split('/').collect();
        match segments.as_slice() {
            [head, policy, rule] if *head == prefix => Some(Self {
                policy: *policy,
                rule: Some(*rule),
            }),
            [head, policy] if *head == prefix => Some(Self {
                policy: *policy,
                rule: None,
            }),
            _ => None,
        }
    }

    /// Rule name, empty for a policy-level deletion
    pub fn rule_name(&self) -> &'a str {
        self.rule.unwrap_or("")
    }
}

/// Parse a deletion key into `(policy, rule, is_deleted)`
pub fn parse_deleted_policy_key(key: &str, prefix: &str) -> (String, String, bool) {
    match DeletedPolicyKey::parse(key, prefix) {
        Some(parsed) => (
            parsed.policy.to_string(),
            parsed.rule_name().to_string(),
            true,
        ),
        None => (String::new(), String::new(), false),
    }
}
