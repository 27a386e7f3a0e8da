//! API-key authorization.
//!
//! Every protected route runs [`require_api_key`] first. A key is accepted
//! when it is alphanumeric and an output folder named after it already exists
//! under the movies root; the handler then receives the caller as an
//! [`AuthorizedCaller`] extension.

use axum::body::Body;
use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use tracing::{debug, warn};

use zclip_models::is_alphanumeric;

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the caller's API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// A caller whose API key passed authorization.
#[derive(Debug, Clone)]
pub struct AuthorizedCaller {
    /// Also the caller's folder name under the movies root.
    pub api_key: String,
}

/// Authorization middleware for protected routes.
pub async fn require_api_key(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let api_key = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing x-api-key header"))?
        .to_string();

    if !is_alphanumeric(&api_key) {
        warn!("Rejected malformed API key");
        return Err(ApiError::bad_request("Invalid API key"));
    }

    let output_dir = state.config.movies_dir.join(&api_key);
    let exists = tokio::fs::metadata(&output_dir)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);
    if !exists {
        warn!(dir = %output_dir.display(), "No output directory for API key");
        return Err(ApiError::bad_request(
            "Directory does not exist for the provided API key",
        ));
    }

    debug!(dir = %output_dir.display(), "API key authorized");
    request
        .extensions_mut()
        .insert(AuthorizedCaller { api_key });

    Ok(next.run(request).await)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthorizedCaller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthorizedCaller>()
            .cloned()
            .ok_or_else(|| ApiError::internal("Route is missing the API-key middleware"))
    }
}
