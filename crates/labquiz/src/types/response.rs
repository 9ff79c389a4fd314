//! Shared API response types

use serde::Serialize;
use uuid::Uuid;

use super::document::Document;

/// Generic message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response from a document upload
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// The stored (or pre-existing) document
    pub document: Document,
    /// True when the upload matched an already stored document
    pub deduplicated: bool,
    /// Why the upload was deduplicated or replaced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Response from queueing a generation job
#[derive(Debug, Serialize)]
pub struct GenerateAccepted {
    pub job_id: Uuid,
    pub document_id: Uuid,
    pub message: String,
}
