//! Shared data models for the ZoomClip render service.
//!
//! This crate provides Serde-serializable types for:
//! - Render jobs and their lifecycle states
//! - Encoding constants shared by the filter builder and executor
//! - Webhook and API payloads
//! - Output naming and path-safety helpers

pub mod encoding;
pub mod job;
pub mod payload;
pub mod utils;

// Re-export common types
pub use encoding::zoom_rate;
pub use job::{JobContractError, JobState, RenderJob};
pub use payload::{CreateVideoResponse, ValidateKeyResponse, WebhookPayload};
pub use utils::{generate_output_filename, is_alphanumeric, is_safe_relative_path};
