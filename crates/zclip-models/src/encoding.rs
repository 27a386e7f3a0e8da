//! Encoding constants shared by the filter builder and the executor.

/// Pixel format every rendered clip is normalized to.
pub const DEFAULT_PIXEL_FORMAT: &str = "yuv420p";
/// Container extension of rendered artifacts.
pub const OUTPUT_EXTENSION: &str = "mp4";
/// Length of the random stem of a generated output filename.
pub const OUTPUT_NAME_LENGTH: usize = 16;

/// Longest clip the service will render, in seconds.
pub const MAX_DURATION_SECS: u32 = 60;

/// Accepted range of the signed zoom percentage.
pub const MIN_ZOOM_PERCENT: i32 = -100;
pub const MAX_ZOOM_PERCENT: i32 = 100;
/// Zoom percentage used when a request leaves the field empty.
pub const DEFAULT_ZOOM_PERCENT: i32 = 2;

/// Per-frame zoom increment reached at 100%.
pub const MAX_ZOOM_RATE: f64 = 0.1;
/// Zoom-in ceiling.
pub const MAX_ZOOM_FACTOR: f64 = 2.0;
/// Zoom-out floor (never below the original framing).
pub const MIN_ZOOM_FACTOR: f64 = 1.0;

/// Convert a zoom percentage into a signed per-frame zoom rate.
///
/// `rate = (percent / 100) * MAX_ZOOM_RATE`, so the default of 2% yields 0.002.
pub fn zoom_rate(zoom_percent: i32) -> f64 {
    f64::from(zoom_percent) / 100.0 * MAX_ZOOM_RATE
}
