use serde::{Deserialize, Serialize};

/// Body returned with `201 Created` once a submission has been committed.
///
/// Only the store-assigned identity is echoed back; none of the submitted
/// personal fields ever leave the server again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    /// Static, per-form confirmation text.
    pub message: String,
    /// Row identifier generated by the store.
    pub id: i64,
    /// Creation timestamp assigned by the store (RFC 3339, UTC).
    pub timestamp: String,
}
