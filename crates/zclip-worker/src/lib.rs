//! Render job pipeline and bounded worker pool.
//!
//! This crate provides:
//! - The per-job state machine (encode, then notify)
//! - Encoder and notifier seams over FFmpeg and the webhook client
//! - A bounded executor that runs jobs off the request path
//! - Structured job logging and metrics

pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod metrics;
pub mod pipeline;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use executor::{JobExecutor, JobHandle};
pub use logging::{JobLogger, JobTracker};
pub use pipeline::{Encoder, JobOutcome, Notifier, RenderPipeline};
