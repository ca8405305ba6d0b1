//! Outbound webhook transport.

use async_trait::async_trait;
use shared_types::AnnouncementResponse;
use std::time::Duration;
use thiserror::Error;

/// Default per-request timeout for webhook posts.
pub const DEFAULT_WEBHOOK_TIMEOUT_MS: u64 = 10_000;

/// One failed webhook post.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("webhook delivery failed: {0}")]
pub struct SendError(pub String);

/// Posts one announcement to one endpoint.
#[async_trait]
pub trait WebhookSender: Send + Sync {
    /// Delivers `response` to `endpoint`; success means the endpoint
    /// acknowledged with a 2xx status.
    async fn send(&self, endpoint: &str, response: &AnnouncementResponse)
        -> Result<(), SendError>;
}

/// HTTP webhook sender posting announcements as JSON.
pub struct HttpWebhookSender {
    client: reqwest::Client,
}

impl HttpWebhookSender {
    /// Builds a sender with the given per-request timeout.
    pub fn new(timeout_ms: u64) -> Result<Self, SendError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| SendError(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl WebhookSender for HttpWebhookSender {
    async fn send(
        &self,
        endpoint: &str,
        response: &AnnouncementResponse,
    ) -> Result<(), SendError> {
        let reply = self
            .client
            .post(endpoint)
            .json(response)
            .send()
            .await
            .map_err(|e| SendError(e.to_string()))?;

        let status = reply.status();
        if !status.is_success() {
            return Err(SendError(format!("endpoint answered {status}")));
        }
        Ok(())
    }
}
