//! Wire payloads exchanged with callers and webhook receivers.

use serde::{Deserialize, Serialize};

/// Body POSTed to the caller's webhook once an artifact is ready.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub record_id: String,
    /// Absolute public URL of the rendered artifact
    pub filename: String,
}

/// Acknowledgement returned when a render job has been accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVideoResponse {
    pub record_id: String,
    /// Generated artifact file name
    pub filename: String,
    pub message: String,
    pub input_width: i64,
    pub input_height: i64,
    pub output_width: i64,
    pub output_height: i64,
}

/// Response of the API-key check endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateKeyResponse {
    pub message: String,
}
