//! FFmpeg CLI wrapper for still-image zoom/pan rendering.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - A subprocess runner that captures stdout/stderr and the exit status
//! - Deterministic filter-graph derivation from a render job
//! - FFprobe dimension probing
//! - Source download into a local cache

pub mod command;
pub mod download;
pub mod error;
pub mod filters;
pub mod metrics;
pub mod probe;

pub use command::{create_render_command, EncodeOutput, FfmpegCommand, FfmpegRunner};
pub use download::{cache_file_name, fetch_to_cache};
pub use error::{MediaError, MediaResult};
pub use filters::{FilterGraph, FilterOptions, FilterStage};
pub use probe::{probe_dimensions, ImageDimensions};
