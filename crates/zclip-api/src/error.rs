//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use zclip_media::MediaError;
use zclip_worker::WorkerError;

use crate::validation::ValidationError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Caller input problem; the message is shown verbatim.
    #[error("{0}")]
    BadRequest(String),

    #[error("Invalid value for '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Source fetch failed: {0}")]
    BadGateway(String),

    #[error("Unprocessable source: {0}")]
    Unprocessable(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn field(&self) -> Option<String> {
        match self {
            ApiError::Validation { field, .. } => Some(field.clone()),
            _ => None,
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::Validation {
            field: err.field.to_string(),
            message: err.message,
        }
    }
}

impl From<MediaError> for ApiError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::DownloadFailed { .. } | MediaError::Http(_) => Self::BadGateway(err.to_string()),
            MediaError::FfprobeFailed { .. } | MediaError::InvalidImage(_) | MediaError::JsonParse(_) => {
                Self::Unprocessable(err.to_string())
            }
            _ => Self::Internal(err.to_string()),
        }
    }
}

impl From<WorkerError> for ApiError {
    fn from(err: WorkerError) -> Self {
        if err.is_rejection() {
            Self::ServiceUnavailable(err.to_string())
        } else {
            Self::Internal(err.to_string())
        }
    }
}

/// Body sent for internal errors unless details are exposed.
pub const INTERNAL_ERROR_DETAIL: &str = "An internal error occurred";

#[derive(Serialize)]
pub(crate) struct ErrorResponse {
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// Full message of an internal error, carried as a response extension.
///
/// The body only says [`INTERNAL_ERROR_DETAIL`]; routers built for
/// non-production use put this message back (see
/// [`crate::middleware::expose_internal_errors`]).
#[derive(Debug, Clone)]
pub struct InternalErrorDetail(pub String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let field = self.field();

        if let ApiError::Internal(_) = &self {
            let body = ErrorResponse {
                detail: INTERNAL_ERROR_DETAIL.to_string(),
                field,
            };
            let mut response = (status, Json(body)).into_response();
            response
                .extensions_mut()
                .insert(InternalErrorDetail(self.to_string()));
            return response;
        }

        let body = ErrorResponse {
            detail: self.to_string(),
            field,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::bad_request("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::ServiceUnavailable("busy".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(MediaError::download_failed("404")).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_saturated_pool_maps_to_503() {
        let err = ApiError::from(WorkerError::PoolSaturated { pending: 3, limit: 3 });
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_internal_detail_stays_off_the_body() {
        let response = ApiError::internal("disk layout leaked").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let detail = response.extensions().get::<InternalErrorDetail>().unwrap();
        assert_eq!(detail.0, "Internal error: disk layout leaked");

        let response = ApiError::bad_request("nope").into_response();
        assert!(response.extensions().get::<InternalErrorDetail>().is_none());
    }

    #[test]
    fn test_bad_request_message_is_verbatim() {
        assert_eq!(
            ApiError::bad_request("Invalid API key").to_string(),
            "Invalid API key"
        );
    }
}
