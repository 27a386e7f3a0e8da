//! API configuration.

use std::path::PathBuf;
use std::time::Duration;

use zclip_models::encoding::{DEFAULT_ZOOM_PERCENT, MAX_ZOOM_PERCENT, MIN_ZOOM_PERCENT};

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// Where downloaded source images are cached
    pub cache_dir: PathBuf,
    /// Root of the per-API-key output folders
    pub movies_dir: PathBuf,
    /// Zoom percentage used when a request leaves it empty
    pub default_zoom_percent: i32,
    /// Hosts (usually IPs) URLs may point at; empty with no domains = any host
    pub allowed_ips: Vec<String>,
    /// Domains URLs may point at
    pub allowed_domains: Vec<String>,
    /// Probe binary
    pub ffprobe_bin: String,
    /// Source download timeout
    pub download_timeout: Duration,
    /// Expose /metrics
    pub metrics_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            max_body_size: 1024 * 1024, // 1MB
            environment: "development".to_string(),
            cache_dir: PathBuf::from("cache"),
            movies_dir: PathBuf::from("movies"),
            default_zoom_percent: DEFAULT_ZOOM_PERCENT,
            allowed_ips: Vec::new(),
            allowed_domains: Vec::new(),
            ffprobe_bin: "ffprobe".to_string(),
            download_timeout: Duration::from_secs(60),
            metrics_enabled: true,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8000),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| split_list(&s))
                .unwrap_or_else(|_| vec!["*".to_string()]),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1024 * 1024),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            cache_dir: PathBuf::from(std::env::var("CACHE_DIR").unwrap_or_else(|_| "cache".to_string())),
            movies_dir: PathBuf::from(std::env::var("MOVIES_DIR").unwrap_or_else(|_| "movies".to_string())),
            default_zoom_percent: std::env::var("DEFAULT_ZOOM_PERCENT")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|z: &i32| (MIN_ZOOM_PERCENT..=MAX_ZOOM_PERCENT).contains(z))
                .unwrap_or(DEFAULT_ZOOM_PERCENT),
            allowed_ips: std::env::var("ALLOWED_IPS")
                .map(|s| split_list(&s))
                .unwrap_or_default(),
            allowed_domains: std::env::var("ALLOWED_DOMAINS")
                .map(|s| split_list(&s))
                .unwrap_or_default(),
            ffprobe_bin: std::env::var("FFPROBE_BIN").unwrap_or_else(|_| "ffprobe".to_string()),
            download_timeout: Duration::from_secs(
                std::env::var("DOWNLOAD_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}

/// Split a comma-separated env value, dropping blanks.
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
