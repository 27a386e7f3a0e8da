//! Webhook HTTP client.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info, warn};

use zclip_models::WebhookPayload;

use crate::error::{WebhookError, WebhookResult};

/// Longest response body kept in an error message.
const MAX_ERROR_BODY: usize = 512;

/// Configuration for the webhook client.
#[derive(Debug, Clone)]
pub struct WebhookClientConfig {
    /// Request timeout
    pub timeout: Duration,
    /// User-Agent sent with every callback
    pub user_agent: String,
}

impl Default for WebhookClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("zclip-webhook/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl WebhookClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            timeout: Duration::from_secs(
                std::env::var("WEBHOOK_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            ..Self::default()
        }
    }
}

/// Client that delivers render results to caller webhooks.
///
/// Each call is a single attempt; nothing here retries.
#[derive(Debug, Clone)]
pub struct WebhookClient {
    http: Client,
    config: WebhookClientConfig,
}

impl WebhookClient {
    /// Create a new webhook client.
    pub fn new(config: WebhookClientConfig) -> WebhookResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(WebhookError::Network)?;

        Ok(Self { http, config })
    }

    /// POST the payload as JSON to `webhook_url`.
    ///
    /// Any 2xx response is success; other statuses and transport failures
    /// are returned as errors.
    pub async fn notify(&self, webhook_url: &str, payload: &WebhookPayload) -> WebhookResult<()> {
        debug!(url = %webhook_url, record_id = %payload.record_id, "Sending webhook");

        let response = self
            .http
            .post(webhook_url)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    WebhookError::Timeout(self.config.timeout.as_secs())
                } else {
                    WebhookError::Network(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            body.truncate(floor_char_boundary(&body, MAX_ERROR_BODY));
            warn!(
                url = %webhook_url,
                status = status.as_u16(),
                "Webhook rejected callback"
            );
            return Err(WebhookError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!(
            url = %webhook_url,
            record_id = %payload.record_id,
            status = status.as_u16(),
            "Webhook delivered"
        );
        Ok(())
    }
}

fn floor_char_boundary(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}
