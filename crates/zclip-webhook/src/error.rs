//! Webhook error types.

use thiserror::Error;

pub type WebhookResult<T> = Result<T, WebhookError>;

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Webhook returned HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Webhook timed out after {0} seconds")]
    Timeout(u64),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid callback host: {0}")]
    InvalidCallbackHost(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl WebhookError {
    /// HTTP status returned by the receiver, if it answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            WebhookError::Rejected { status, .. } => Some(*status),
            WebhookError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
