//! Axum HTTP API for the ZoomClip render service.
//!
//! This crate provides:
//! - API-key authorization against per-caller output folders
//! - Request validation and URL allow-listing
//! - Source download, probing and job submission
//! - Static serving of rendered artifacts
//! - Prometheus metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod security;
pub mod state;
pub mod validation;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
