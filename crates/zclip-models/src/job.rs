//! Render job definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::encoding::MAX_DURATION_SECS;
use crate::utils::is_safe_relative_path;

/// Lifecycle state of a render job.
///
/// Validation and download happen in the request layer; everything from
/// `Encoding` on is driven by the worker pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    #[default]
    Accepted,
    Validating,
    Downloading,
    Encoding,
    Notifying,
    Completed,
    EncodeFailed,
    NotifyFailed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Accepted => "accepted",
            JobState::Validating => "validating",
            JobState::Downloading => "downloading",
            JobState::Encoding => "encoding",
            JobState::Notifying => "notifying",
            JobState::Completed => "completed",
            JobState::EncodeFailed => "encode_failed",
            JobState::NotifyFailed => "notify_failed",
        }
    }

    /// Check if this is a terminal state (no further transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::EncodeFailed | JobState::NotifyFailed
        )
    }

    /// Check whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(&self, next: JobState) -> bool {
        matches!(
            (self, next),
            (JobState::Accepted, JobState::Validating)
                | (JobState::Validating, JobState::Downloading)
                | (JobState::Downloading, JobState::Encoding)
                | (JobState::Encoding, JobState::Notifying)
                | (JobState::Encoding, JobState::EncodeFailed)
                | (JobState::Notifying, JobState::Completed)
                | (JobState::Notifying, JobState::NotifyFailed)
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A job whose parameters break the invariants the encoder relies on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobContractError {
    #[error("{field} must be positive, got {value}")]
    NonPositiveDimension { field: &'static str, value: i64 },

    #[error("framerate must be positive")]
    ZeroFramerate,

    #[error("duration must be between 1 and {MAX_DURATION_SECS} seconds, got {0}")]
    DurationOutOfRange(u32),

    #[error("{duration_secs}s at {framerate}fps overflows the frame counter")]
    FrameCountOverflow { duration_secs: u32, framerate: u32 },

    #[error("output path is not a safe relative path: {0}")]
    UnsafeOutputPath(PathBuf),
}

/// A fully validated render request, ready for the worker pipeline.
///
/// Shared read-only once submitted; components derive filter strings and
/// process arguments from it without mutating it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderJob {
    /// Caller-supplied identifier echoed in the webhook
    pub record_id: String,

    /// Cached source image
    pub input_path: PathBuf,

    /// Probed source dimensions
    pub input_width: i64,
    pub input_height: i64,

    /// Target frame dimensions
    pub output_width: i64,
    pub output_height: i64,

    /// Frames per second
    pub framerate: u32,

    /// Clip length in seconds
    pub duration_secs: u32,

    /// Signed zoom percentage in [-100, 100]
    pub zoom_percent: i32,

    /// Crop-to-fill instead of letterboxing when aspect ratios differ
    pub crop_enabled: bool,

    /// Artifact location relative to the output root
    pub output_path: PathBuf,

    /// Callback destination
    pub webhook_url: String,

    /// Host the caller reached us on; used for the public artifact URL
    pub callback_host: String,

    /// When the request was accepted
    pub created_at: DateTime<Utc>,
}

impl RenderJob {
    /// Total number of frames the encoder will emit, if it fits a `u32`.
    pub fn total_frames(&self) -> Option<u32> {
        self.duration_secs.checked_mul(self.framerate)
    }

    /// Whether the source already has the target frame size.
    pub fn dimensions_match(&self) -> bool {
        self.input_width == self.output_width && self.input_height == self.output_height
    }

    /// Verify the invariants the encoding stage depends on.
    ///
    /// Every field here should already have passed request validation, so a
    /// failure indicates a bug upstream rather than bad caller input.
    pub fn check_contract(&self) -> Result<(), JobContractError> {
        for (field, value) in [
            ("input_width", self.input_width),
            ("input_height", self.input_height),
            ("output_width", self.output_width),
            ("output_height", self.output_height),
        ] {
            if value <= 0 {
                return Err(JobContractError::NonPositiveDimension { field, value });
            }
        }

        if self.framerate == 0 {
            return Err(JobContractError::ZeroFramerate);
        }

        if self.duration_secs == 0 || self.duration_secs > MAX_DURATION_SECS {
            return Err(JobContractError::DurationOutOfRange(self.duration_secs));
        }

        if self.total_frames().is_none() {
            return Err(JobContractError::FrameCountOverflow {
                duration_secs: self.duration_secs,
                framerate: self.framerate,
            });
        }

        if !is_safe_relative_path(&self.output_path) {
            return Err(JobContractError::UnsafeOutputPath(self.output_path.clone()));
        }

        Ok(())
    }
}
