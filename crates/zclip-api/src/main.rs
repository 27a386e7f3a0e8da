//! Axum API server binary.

use std::net::SocketAddr;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use zclip_api::{create_router, metrics, ApiConfig, AppState};
use zclip_media::command::check_ffmpeg;
use zclip_worker::WorkerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Install rustls crypto provider (required for rustls 0.23+)
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("zclip_api=info,zclip_worker=info,zclip_media=info,zclip_webhook=info,tower_http=warn")
    });

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting zclip-api");

    let config = ApiConfig::from_env();
    let worker_config = WorkerConfig::from_env();
    info!(
        "API config: host={}, port={}, movies_dir={}, cache_dir={}",
        config.host,
        config.port,
        config.movies_dir.display(),
        config.cache_dir.display()
    );
    info!(
        "Worker config: max_jobs={}, max_queued={}, apply_zoom={}",
        worker_config.max_concurrent_jobs, worker_config.max_queued_jobs, worker_config.apply_zoom
    );

    tokio::fs::create_dir_all(&config.cache_dir)
        .await
        .with_context(|| format!("creating cache dir {}", config.cache_dir.display()))?;
    tokio::fs::create_dir_all(&config.movies_dir)
        .await
        .with_context(|| format!("creating movies dir {}", config.movies_dir.display()))?;

    if let Err(e) = check_ffmpeg(&worker_config.ffmpeg_bin) {
        warn!("{}; render jobs will fail until it is installed", e);
    }

    let metrics_handle = if config.metrics_enabled {
        info!("Prometheus metrics enabled at /metrics");
        Some(metrics::init_metrics().context("installing Prometheus recorder")?)
    } else {
        None
    };

    let shutdown_timeout = worker_config.shutdown_timeout;
    let state = AppState::new(config.clone(), worker_config).context("creating application state")?;
    let executor = std::sync::Arc::clone(&state.executor);

    let app = create_router(state, metrics_handle);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("invalid bind address")?;

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if !executor.shutdown(shutdown_timeout).await {
        warn!("Exiting with render jobs still in flight");
    }

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for CTRL+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
