//! API routes.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;

use crate::auth::require_api_key;
use crate::error::ApiError;
use crate::handlers::{create_video, health, validate_key};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, expose_internal_errors, request_context, response_headers};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    // Routes behind the API-key check
    let protected_routes = Router::new()
        .route("/api/validate", get(validate_key))
        .route("/create-video", post(create_video))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health));

    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    // Rendered artifacts, addressed by the same path the webhook advertises
    let artifacts = ServeDir::new(&state.config.movies_dir);
    let router = Router::new()
        .merge(protected_routes)
        .merge(health_routes)
        .merge(metrics_routes);
    let router = if state.artifact_prefix.is_empty() {
        router.fallback_service(artifacts)
    } else {
        router
            .nest_service(&format!("/{}", state.artifact_prefix), artifacts)
            .fallback(|| async { ApiError::not_found("No such route") })
    };

    let expose_errors = !state.config.is_production();

    router
        .layer(middleware::from_fn_with_state(expose_errors, expose_internal_errors))
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(response_headers))
        .layer(middleware::from_fn(request_context))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
