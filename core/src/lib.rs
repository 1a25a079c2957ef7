//! ReportFold Core Module
//!
//! Folds partial policy-result change requests into a canonical report per
//! subject. Each merge cycle reseeds a hash table from the previous report,
//! drops entries for resources announced as deleted, overlays the incoming
//! entries by identity key and recomputes the status summary.
//!
//! The merge is synchronous and works on in-memory copies; serializing
//! merge cycles for the same report is the caller's job.

pub mod change_request;
pub mod config;
pub mod eraser;
pub mod errors;
pub mod identity;
pub mod model;
pub mod summary;
pub mod table;
pub mod tombstone;
pub mod updater;

pub use change_request::{
    AggregatedChangeRequests, ChangeRequest, ClusterReportChangeRequest, ObjectMeta,
    ReportChangeRequest,
};
pub use config::{ConfigError, MergeConfig, MergeConfigManager};
pub use eraser::{PolicyReportEraser, ReportGenerator};
pub use errors::{MergeError, Result};
pub use identity::{derive_key, IdentityKey};
pub use model::{Document, ResourceRef, ResultEntry, Status, Summary};
pub use summary::summarize;
pub use table::{ResultTable, SeedingMode};
pub use tombstone::{parse_deleted_policy_key, DeletedPolicyKey, DeletedResource, MetadataKeys};
pub use updater::{update_results, MergeOutcome, ReportUpdater};
