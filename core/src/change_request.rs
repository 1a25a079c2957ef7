//! Change request fragments
//!
//! Producers emit one change request per evaluated resource or batch. The
//! merge only reads their labels and annotations to find deletion markers.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::tombstone::{DeletedResource, MetadataKeys};

/// Object metadata carried by every change request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

/// Read access to a change request's metadata
pub trait ChangeRequest {
    fn metadata(&self) -> &ObjectMeta;

    fn labels(&self) -> &BTreeMap<String, String> {
        &self.metadata().labels
    }

    fn annotations(&self) -> &BTreeMap<String, String> {
        &self.metadata().annotations
    }

    /// Deletion marker announced by this change request, if any
    fn deleted_resource(&self, keys: &MetadataKeys) -> Option<DeletedResource> {
        DeletedResource::from_metadata(self.labels(), self.annotations(), keys)
    }
}

/// Change request for a namespaced subject
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportChangeRequest {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub results: Vec<Value>,
}

/// Change request for a cluster-scoped subject
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterReportChangeRequest {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub results: Vec<Value>,
}

impl ChangeRequest for ReportChangeRequest {
    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }
}

impl ChangeRequest for ClusterReportChangeRequest {
    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }
}

/// The change requests folded into one report, all of the same scope
#[derive(Debug, Clone, PartialEq)]
pub enum AggregatedChangeRequests {
    Namespaced(Vec<ReportChangeRequest>),
    Cluster(Vec<ClusterReportChangeRequest>),
}

impl Default for AggregatedChangeRequests {
    fn default() -> Self {
        AggregatedChangeRequests::Namespaced(Vec::new())
    }
}

impl AggregatedChangeRequests {
    pub fn len(&self) -> usize {
        match self {
            AggregatedChangeRequests::Namespaced(requests) => requests.len(),
            AggregatedChangeRequests::Cluster(requests) => requests.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deletion markers in delivery order
    pub fn deleted_resources(&self, keys: &MetadataKeys) -> Vec<DeletedResource> {
        match self {
            AggregatedChangeRequests::Namespaced(requests) => collect_deleted(requests, keys),
            AggregatedChangeRequests::Cluster(requests) => collect_deleted(requests, keys),
        }
    }
}

fn collect_deleted<R: ChangeRequest>(requests: &[R], keys: &MetadataKeys) -> Vec<DeletedResource> {
    requests
        .iter()
        .filter_map(|request| request.deleted_resource(keys))
        .collect()
}
