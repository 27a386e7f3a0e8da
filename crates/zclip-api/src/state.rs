//! Application state.

use std::sync::Arc;

use zclip_worker::{JobExecutor, WorkerConfig};

use crate::config::ApiConfig;
use crate::security::UrlPolicy;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub url_policy: Arc<UrlPolicy>,
    pub executor: Arc<JobExecutor>,
    /// Client used to fetch source images
    pub http: reqwest::Client,
    /// URL path the movies root is served under
    pub artifact_prefix: String,
}

impl AppState {
    /// Create application state with an FFmpeg-backed executor.
    ///
    /// The worker writes under the same movies root the API authorizes
    /// against and serves from.
    pub fn new(config: ApiConfig, mut worker_config: WorkerConfig) -> anyhow::Result<Self> {
        worker_config.output_root = config.movies_dir.clone();
        let executor = JobExecutor::from_config(&worker_config)?;
        Self::with_executor(config, &worker_config, Arc::new(executor))
    }

    /// Create application state around an existing executor.
    pub fn with_executor(
        config: ApiConfig,
        worker_config: &WorkerConfig,
        executor: Arc<JobExecutor>,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.download_timeout)
            .user_agent(concat!("zclip-api/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let url_policy = UrlPolicy::from_config(&config);
        if !url_policy.is_strict() {
            tracing::warn!("No ALLOWED_IPS/ALLOWED_DOMAINS configured; any URL host is accepted");
        }

        Ok(Self {
            config: Arc::new(config),
            url_policy: Arc::new(url_policy),
            executor,
            http,
            artifact_prefix: worker_config.artifact.path_prefix.trim_matches('/').to_string(),
        })
    }
}
