//! Webhook notifier for completed renders.
//!
//! Delivers exactly one POST per job and builds the public artifact URL
//! that goes into the payload.

pub mod artifact;
pub mod client;
pub mod error;

pub use artifact::{artifact_url, ArtifactUrlConfig};
pub use client::{WebhookClient, WebhookClientConfig};
pub use error::{WebhookError, WebhookResult};
