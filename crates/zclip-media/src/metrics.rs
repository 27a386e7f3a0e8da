//! Media metrics.

use metrics::histogram;

/// Metric names as constants for consistency.
pub mod names {
    pub const DOWNLOAD_DURATION_SECONDS: &str = "zclip_download_duration_seconds";
    pub const DOWNLOAD_BYTES: &str = "zclip_download_bytes";
}

/// Record a finished source download.
pub fn record_download(success: bool, duration_secs: f64, bytes: u64) {
    let labels = [("success", success.to_string())];
    histogram!(names::DOWNLOAD_DURATION_SECONDS, &labels).record(duration_secs);
    if success {
        histogram!(names::DOWNLOAD_BYTES).record(bytes as f64);
    }
}
