//! Video API handlers.

use std::path::PathBuf;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Host, State};
use axum::Json;
use chrono::Utc;
use serde_json::Value;
use tracing::{info, warn, Span};

use zclip_media::{fetch_to_cache, probe_dimensions};
use zclip_models::{
    generate_output_filename, is_alphanumeric, CreateVideoResponse, JobState, RenderJob,
    ValidateKeyResponse,
};
use zclip_worker::JobTracker;

use crate::auth::AuthorizedCaller;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::validation::validate_render_request;

/// Confirm that the caller's API key is usable.
pub async fn validate_key(_caller: AuthorizedCaller) -> Json<ValidateKeyResponse> {
    Json(ValidateKeyResponse {
        message: "API key is valid".to_string(),
    })
}

/// Accept a render request.
///
/// Validates the body, caches and probes the source image, then hands the
/// job to the worker pool and returns without waiting for the encode.
pub async fn create_video(
    State(state): State<AppState>,
    Host(host): Host,
    caller: AuthorizedCaller,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<CreateVideoResponse>> {
    let Json(body) = body.map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {}", e.body_text())))?;

    let log_id = body
        .get("record_id")
        .and_then(Value::as_str)
        .filter(|id| is_alphanumeric(id))
        .unwrap_or("unknown")
        .to_string();
    let mut tracker = JobTracker::new(&log_id, "create_video");

    tracker.advance(JobState::Validating);
    let params = validate_render_request(&body, &state.url_policy, state.config.default_zoom_percent)
        .map_err(|e| {
            tracker.logger().log_warning(&format!("Validation failed: {}", e));
            ApiError::from(e)
        })?;
    Span::current().record("record_id", params.record_id.as_str());

    tracker.advance(JobState::Downloading);
    let input_path = fetch_to_cache(
        &state.http,
        &params.input_url,
        &state.config.cache_dir,
        params.use_cache,
    )
    .await
    .map_err(|e| {
        tracker.logger().log_error(&format!("Failed to fetch input: {}", e));
        ApiError::from(e)
    })?;

    let dims = probe_dimensions(&state.config.ffprobe_bin, &input_path)
        .await
        .map_err(|e| {
            tracker.logger().log_error(&format!("Failed to probe input: {}", e));
            ApiError::from(e)
        })?;

    let filename = generate_output_filename();
    let job = RenderJob {
        record_id: params.record_id.clone(),
        input_path,
        input_width: dims.width,
        input_height: dims.height,
        output_width: params.output_width,
        output_height: params.output_height,
        framerate: params.framerate,
        duration_secs: params.duration_secs,
        zoom_percent: params.zoom_percent,
        crop_enabled: params.crop_enabled,
        output_path: PathBuf::from(&caller.api_key).join(&filename),
        webhook_url: params.webhook_url,
        callback_host: host,
        created_at: Utc::now(),
    };

    // The handle is dropped: the job keeps running detached.
    state.executor.submit(job).map_err(|e| {
        warn!(record_id = %params.record_id, "Job not accepted: {}", e);
        ApiError::from(e)
    })?;

    info!(
        record_id = %params.record_id,
        filename = %filename,
        input = %format!("{}x{}", dims.width, dims.height),
        output = %format!("{}x{}", params.output_width, params.output_height),
        "Video processing started"
    );

    Ok(Json(CreateVideoResponse {
        record_id: params.record_id,
        filename,
        message: "Video processing started".to_string(),
        input_width: dims.width,
        input_height: dims.height,
        output_width: params.output_width,
        output_height: params.output_height,
    }))
}
