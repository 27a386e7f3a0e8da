//! Render request validation.
//!
//! Turns the raw JSON body into typed [`RenderParams`]. Fields are checked in
//! a fixed order and the first failure is reported, naming the field.

use serde_json::{Map, Value};

use zclip_models::encoding::{MAX_DURATION_SECS, MAX_ZOOM_PERCENT, MIN_ZOOM_PERCENT};
use zclip_models::is_alphanumeric;

use crate::security::{UrlPolicy, UrlRejection};

/// A rejected request field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Typed render parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderParams {
    pub record_id: String,
    pub input_url: String,
    pub webhook_url: String,
    pub framerate: u32,
    pub duration_secs: u32,
    pub zoom_percent: i32,
    pub crop_enabled: bool,
    pub output_width: i64,
    pub output_height: i64,
    /// Reuse a previously downloaded copy of `input_url`
    pub use_cache: bool,
}

/// Validate a `create-video` body.
pub fn validate_render_request(
    body: &Value,
    policy: &UrlPolicy,
    default_zoom_percent: i32,
) -> Result<RenderParams, ValidationError> {
    let obj = body
        .as_object()
        .ok_or_else(|| ValidationError::new("body", "Request body must be a JSON object"))?;

    let record_id = require_str(obj, "record_id")?;
    if !is_alphanumeric(record_id) {
        return Err(ValidationError::new(
            "record_id",
            "Invalid record ID: must be non-empty and alphanumeric",
        ));
    }

    let input_url = check_url(obj, "input_url", policy, UrlPolicy::check)?;
    let webhook_url = check_url(obj, "webhook_url", policy, UrlPolicy::check_http)?;

    let framerate = require_int(obj, "framerate")?;
    if framerate <= 0 || framerate > i64::from(u32::MAX) {
        return Err(ValidationError::new("framerate", "Invalid framerate: must be a positive integer"));
    }
    let framerate = framerate as u32;

    let duration = require_int(obj, "duration")?;
    if duration <= 0 || duration > i64::from(MAX_DURATION_SECS) {
        return Err(ValidationError::new(
            "duration",
            format!("Invalid duration: must be between 1 and {} seconds", MAX_DURATION_SECS),
        ));
    }
    let duration_secs = duration as u32;
    if duration_secs.checked_mul(framerate).is_none() {
        return Err(ValidationError::new(
            "duration",
            "Invalid duration: frame count overflows at this framerate",
        ));
    }

    let zoom_percent = match obj.get("zoom") {
        None | Some(Value::Null) => default_zoom_percent,
        Some(Value::String(s)) if s.trim().is_empty() => default_zoom_percent,
        Some(value) => {
            let zoom = as_int(value).ok_or_else(|| {
                ValidationError::new("zoom", "Invalid zoom level: must be an integer")
            })?;
            if zoom < i64::from(MIN_ZOOM_PERCENT) || zoom > i64::from(MAX_ZOOM_PERCENT) {
                return Err(ValidationError::new(
                    "zoom",
                    format!(
                        "Invalid zoom level: must be between {} and {}",
                        MIN_ZOOM_PERCENT, MAX_ZOOM_PERCENT
                    ),
                ));
            }
            zoom as i32
        }
    };

    let crop_enabled = require_bool(obj, "crop")?;

    let output_width = require_int(obj, "output_width")?;
    if output_width <= 0 {
        return Err(ValidationError::new("output_width", "Invalid output width: must be positive"));
    }
    let output_height = require_int(obj, "output_height")?;
    if output_height <= 0 {
        return Err(ValidationError::new("output_height", "Invalid output height: must be positive"));
    }

    let use_cache = match obj.get("cache") {
        None | Some(Value::Null) => true,
        Some(value) => as_bool(value)
            .ok_or_else(|| ValidationError::new("cache", "Invalid cache setting: must be a boolean"))?,
    };

    Ok(RenderParams {
        record_id: record_id.to_string(),
        input_url,
        webhook_url,
        framerate,
        duration_secs,
        zoom_percent,
        crop_enabled,
        output_width,
        output_height,
        use_cache,
    })
}

fn require_str<'a>(obj: &'a Map<String, Value>, field: &'static str) -> Result<&'a str, ValidationError> {
    match obj.get(field) {
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(ValidationError::new(field, "must be a string")),
        None => Err(ValidationError::new(field, "is required")),
    }
}

fn check_url(
    obj: &Map<String, Value>,
    field: &'static str,
    policy: &UrlPolicy,
    check: fn(&UrlPolicy, &str) -> Result<String, UrlRejection>,
) -> Result<String, ValidationError> {
    let raw = require_str(obj, field)?;
    check(policy, raw)
        .map_err(|reason| ValidationError::new(field, format!("Invalid URL: {}", reason)))
}

fn require_int(obj: &Map<String, Value>, field: &'static str) -> Result<i64, ValidationError> {
    let value = obj
        .get(field)
        .filter(|v| !v.is_null())
        .ok_or_else(|| ValidationError::new(field, "is required"))?;
    as_int(value).ok_or_else(|| ValidationError::new(field, "must be an integer"))
}

fn require_bool(obj: &Map<String, Value>, field: &'static str) -> Result<bool, ValidationError> {
    let value = obj
        .get(field)
        .filter(|v| !v.is_null())
        .ok_or_else(|| ValidationError::new(field, "is required"))?;
    as_bool(value).ok_or_else(|| ValidationError::new(field, "must be true or false"))
}

/// JSON integer or a decimal integer string. Floats are refused.
fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// JSON boolean or `"true"`/`"false"` in any case.
fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}
