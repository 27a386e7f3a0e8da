//! Worker metrics.

use metrics::{counter, gauge, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const JOBS_SUBMITTED_TOTAL: &str = "zclip_jobs_submitted_total";
    pub const JOBS_REJECTED_TOTAL: &str = "zclip_jobs_rejected_total";
    pub const JOBS_IN_FLIGHT: &str = "zclip_jobs_in_flight";
    pub const JOB_OUTCOMES_TOTAL: &str = "zclip_job_outcomes_total";
    pub const CONTRACT_VIOLATIONS_TOTAL: &str = "zclip_contract_violations_total";
    pub const FFMPEG_DURATION_SECONDS: &str = "zclip_ffmpeg_duration_seconds";
    pub const WEBHOOK_DURATION_SECONDS: &str = "zclip_webhook_duration_seconds";
}

pub fn record_job_submitted() {
    counter!(names::JOBS_SUBMITTED_TOTAL).increment(1);
}

pub fn record_job_rejected(reason: &str) {
    let labels = [("reason", reason.to_string())];
    counter!(names::JOBS_REJECTED_TOTAL, &labels).increment(1);
}

pub fn set_jobs_in_flight(count: usize) {
    gauge!(names::JOBS_IN_FLIGHT).set(count as f64);
}

/// Record a terminal outcome (`completed`, `encode_failed`, `notify_failed`).
pub fn record_job_outcome(outcome: &str) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::JOB_OUTCOMES_TOTAL, &labels).increment(1);
}

pub fn record_contract_violation() {
    counter!(names::CONTRACT_VIOLATIONS_TOTAL).increment(1);
}

pub fn record_ffmpeg_duration(success: bool, duration_secs: f64) {
    let labels = [("success", success.to_string())];
    histogram!(names::FFMPEG_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn record_webhook_duration(success: bool, duration_secs: f64) {
    let labels = [("success", success.to_string())];
    histogram!(names::WEBHOOK_DURATION_SECONDS, &labels).record(duration_secs);
}
