//! Fan-out of one announcement to every interested endpoint.

use crate::sender::WebhookSender;
use crate::subscribers::SubscriberRegistry;
use async_trait::async_trait;
use futures::future::join_all;
use shared_types::AnnouncementResponse;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Outcome of a fully successful fan-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Endpoints that acknowledged the announcement.
    pub delivered: usize,
}

/// One endpoint that did not acknowledge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedDelivery {
    /// Endpoint that failed.
    pub endpoint: String,
    /// Transport's description of the failure.
    pub reason: String,
}

/// Fan-out with at least one failed endpoint.
///
/// Every endpoint was attempted regardless; `failed` lists only the ones
/// that did not acknowledge.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct DeliveryError {
    /// Total endpoints attempted.
    pub attempted: usize,
    /// Endpoints that failed, in resolution order.
    pub failed: Vec<FailedDelivery>,
}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} webhook deliveries failed",
            self.failed.len(),
            self.attempted
        )
    }
}

/// Delivery seam between the job worker and the webhook fan-out.
#[async_trait]
pub trait Announce: Send + Sync {
    /// Delivers `response` to every interested endpoint. `Ok` means every
    /// endpoint acknowledged (vacuously true with no subscribers).
    async fn deliver(&self, response: &AnnouncementResponse)
        -> Result<DeliveryReport, DeliveryError>;
}

/// Webhook fan-out over a subscriber registry and a sender transport.
pub struct WebhookAnnouncer {
    subscribers: Arc<dyn SubscriberRegistry>,
    sender: Arc<dyn WebhookSender>,
}

impl WebhookAnnouncer {
    /// Wires the announcer to its registry and transport.
    pub fn new(subscribers: Arc<dyn SubscriberRegistry>, sender: Arc<dyn WebhookSender>) -> Self {
        Self {
            subscribers,
            sender,
        }
    }

    /// Registered subscribers plus the announcement's own per-request
    /// webhook, deduplicated.
    fn resolve_endpoints(&self, response: &AnnouncementResponse) -> Vec<String> {
        let category = response.announcement.category();
        let mut endpoints = self.subscribers.endpoints_for(response.schema_id, category);
        if let Some(request_hook) = &response.webhook_url {
            if !endpoints.contains(request_hook) {
                endpoints.push(request_hook.clone());
            }
        }
        endpoints
    }
}

#[async_trait]
impl Announce for WebhookAnnouncer {
    async fn deliver(
        &self,
        response: &AnnouncementResponse,
    ) -> Result<DeliveryReport, DeliveryError> {
        let endpoints = self.resolve_endpoints(response);
        if endpoints.is_empty() {
            debug!(
                schema_id = response.schema_id,
                category = response.announcement.category(),
                "no subscribers for announcement"
            );
            return Ok(DeliveryReport { delivered: 0 });
        }

        let attempts = endpoints
            .iter()
            .map(|endpoint| async move { (endpoint, self.sender.send(endpoint, response).await) });

        let attempted = endpoints.len();
        let mut failed = Vec::new();
        for (endpoint, outcome) in join_all(attempts).await {
            if let Err(error) = outcome {
                warn!(endpoint = %endpoint, %error, "webhook delivery failed");
                failed.push(FailedDelivery {
                    endpoint: endpoint.clone(),
                    reason: error.to_string(),
                });
            }
        }

        if failed.is_empty() {
            debug!(attempted, "announcement delivered to all subscribers");
            Ok(DeliveryReport {
                delivered: attempted,
            })
        } else {
            Err(DeliveryError { attempted, failed })
        }
    }
}
