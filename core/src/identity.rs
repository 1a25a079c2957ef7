//! Identity keys for result entries
//!
//! An entry is identified by its policy, its rule and the kind, namespace
//! and name of its *first* resource. Entries with no resources have no
//! identity and are left out of deduplication.

use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fmt;

use crate::model::ResultEntry;

/// Separator placed between the key components
pub const KEY_SEPARATOR: &str = "-";

/// Deterministic deduplication key of a result entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey(String);

impl IdentityKey {
    /// Join the five identity components with [`KEY_SEPARATOR`]
    pub fn compose(policy: &str, rule: &str, kind: &str, namespace: &str, name: &str) -> Self {
        Self([policy, rule, kind, namespace, name].join(KEY_SEPARATOR))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// First resource of a raw result entry, if it has one
pub fn primary_resource(entry: &Map<String, Value>) -> Option<&Map<String, Value>> {
    entry
        .get("resources")
        .and_then(Value::as_array)
        .and_then(|resources| resources.first())
        .and_then(Value::as_object)
}

/// Derive the identity key of a raw result entry
///
/// Returns `None` when the entry has no resources.
pub fn derive_key(entry: &Map<String, Value>) -> Option<IdentityKey> {
    let resource = primary_resource(entry)?;
    Some(IdentityKey::compose(
        &field_text(entry, "policy"),
        &field_text(entry, "rule"),
        &field_text(resource, "kind"),
        &field_text(resource, "namespace"),
        &field_text(resource, "name"),
    ))
}

impl ResultEntry {
    /// Identity key of a typed entry; `None` when it has no resources
    pub fn identity_key(&self) -> Option<IdentityKey> {
        let resource = self.resources.first()?;
        Some(IdentityKey::compose(
            &self.policy,
            &self.rule,
            &resource.kind,
            &resource.namespace,
            &resource.name,
        ))
    }
}

/// Text of a scalar field; missing and null fields render as empty
fn field_text<'a>(map: &'a Map<String, Value>, field: &str) -> Cow<'a, str> {
    match map.get(field) {
        Some(Value::String(s)) => Cow::Borrowed(s.as_str()),
        None | Some(Value::Null) => Cow::Borrowed(""),
        Some(other) => Cow::Owned(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ResourceRef, Status};
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_key_uses_first_resource_only() {
        let entry = object(json!({
            "policy": "require-labels",
            "rule": "check-team",
            "result": "fail",
            "resources": [
                {"kind": "Pod", "namespace": "default", "name": "nginx"},
                {"kind": "Pod", "namespace": "default", "name": "redis"}
            ]
        }));

        let key = derive_key(&entry).unwrap();
        assert_eq!(key.as_str(), "require-labels-check-team-Pod-default-nginx");
    }

    #[test]
    fn test_entry_without_resources_has_no_key() {
        let empty = object(json!({"policy": "p", "rule": "r", "resources": []}));
        assert_eq!(derive_key(&empty), None);

        let missing = object(json!({"policy": "p", "rule": "r"}));
        assert_eq!(derive_key(&missing), None);
    }

    #[test]
    fn test_cluster_scoped_resource_has_empty_namespace_component() {
        let entry = object(json!({
            "policy": "p",
            "rule": "r",
            "resources": [{"kind": "Namespace", "name": "team-a"}]
        }));
        assert_eq!(derive_key(&entry).unwrap().as_str(), "p-r-Namespace--team-a");
    }

    #[test]
    fn test_typed_and_raw_keys_agree() {
        let typed = ResultEntry::new(
            "p",
            "r",
            Status::Pass,
            vec![ResourceRef::new("Deployment", "prod", "api")],
        );
        let raw = object(typed.to_value().unwrap());
        assert_eq!(typed.identity_key(), derive_key(&raw));

        let degenerate = ResultEntry::new("p", "r", Status::Pass, vec![]);
        assert_eq!(degenerate.identity_key(), None);
    }
}
