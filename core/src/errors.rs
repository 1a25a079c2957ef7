//! Merge errors

/// Errors raised while folding a change request batch into a report
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("Structural conversion failed: {0}")]
    StructuralConversion(#[from] serde_json::Error),

    #[error("Failed to write '{field}' into report: {reason}")]
    DocumentWrite { field: String, reason: String },

    #[error("Invalid report document: {0}")]
    InvalidDocument(String),
}

/// Result type for merge operations
pub type Result<T> = std::result::Result<T, MergeError>;
