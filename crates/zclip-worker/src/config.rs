//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

use zclip_media::FilterOptions;
use zclip_models::encoding::DEFAULT_PIXEL_FORMAT;
use zclip_webhook::{ArtifactUrlConfig, WebhookClientConfig};

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum concurrent encodes
    pub max_concurrent_jobs: usize,
    /// Maximum jobs waiting for a free slot
    pub max_queued_jobs: usize,
    /// Root that job output paths are relative to
    pub output_root: PathBuf,
    /// Encoder binary
    pub ffmpeg_bin: String,
    /// Pixel format of rendered clips
    pub pixel_format: String,
    /// Append the zoom stage to the filter graph
    pub apply_zoom: bool,
    /// Kill the encoder after this long (unset: wait indefinitely)
    pub encode_timeout: Option<Duration>,
    /// Graceful shutdown timeout
    pub shutdown_timeout: Duration,
    /// Public artifact URL settings
    pub artifact: ArtifactUrlConfig,
    /// Webhook client settings
    pub webhook: WebhookClientConfig,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 2,
            max_queued_jobs: 64,
            output_root: PathBuf::from("movies"),
            ffmpeg_bin: "ffmpeg".to_string(),
            pixel_format: DEFAULT_PIXEL_FORMAT.to_string(),
            apply_zoom: false,
            encode_timeout: None,
            shutdown_timeout: Duration::from_secs(30),
            artifact: ArtifactUrlConfig::default(),
            webhook: WebhookClientConfig::default(),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let output_root = std::env::var("MOVIES_DIR").unwrap_or_else(|_| "movies".to_string());

        Self {
            max_concurrent_jobs: std::env::var("WORKER_MAX_JOBS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(2),
            max_queued_jobs: std::env::var("WORKER_MAX_QUEUED_JOBS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(64),
            ffmpeg_bin: std::env::var("FFMPEG_BIN").unwrap_or_else(|_| "ffmpeg".to_string()),
            pixel_format: std::env::var("WORKER_PIXEL_FORMAT")
                .unwrap_or_else(|_| DEFAULT_PIXEL_FORMAT.to_string()),
            apply_zoom: std::env::var("WORKER_APPLY_ZOOM")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            encode_timeout: std::env::var("WORKER_ENCODE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            shutdown_timeout: Duration::from_secs(
                std::env::var("WORKER_SHUTDOWN_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            artifact: ArtifactUrlConfig {
                scheme: std::env::var("SCHEME").unwrap_or_else(|_| "https".to_string()),
                public_port: std::env::var("PUBLIC_PORT")
                    .ok()
                    .and_then(|s| s.parse().ok()),
                path_prefix: std::env::var("ARTIFACT_PATH_PREFIX")
                    .unwrap_or_else(|_| "movies".to_string()),
            },
            webhook: WebhookClientConfig::from_env(),
            output_root: PathBuf::from(output_root),
        }
    }

    /// Filter-graph options derived from this config.
    pub fn filter_options(&self) -> FilterOptions {
        FilterOptions {
            pixel_format: self.pixel_format.clone(),
            apply_zoom: self.apply_zoom,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorkerConfig::default();
        assert!(!config.apply_zoom);
        assert!(config.encode_timeout.is_none());
        assert_eq!(config.filter_options(), FilterOptions::default());
        assert_eq!(config.artifact.path_prefix, "movies");
    }
}
