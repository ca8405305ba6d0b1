//! Request and response bodies.

use serde::{Deserialize, Serialize};
use shared_types::SchemaId;
use uuid::Uuid;

/// Block-range search query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// Highest block to scan; the chain tip when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_bound: Option<u64>,
    /// Number of blocks to scan downward from the upper bound.
    pub block_count: u64,
    /// Optional narrowing of the scan.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<SearchFilters>,
    /// Webhook to receive announcements found by this search.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

/// Narrowing filters for a search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    /// Only announcements under these schema ids.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schema_ids: Vec<SchemaId>,
    /// Only announcements from these DSNP user ids.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub from_ids: Vec<String>,
}

/// Acceptance receipt for a search request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchAck {
    /// Always "ENQUEUED"; the search runs asynchronously.
    pub status: String,
    /// Job tracking the search.
    pub job_id: Uuid,
}

/// Webhook subscription request; at least one of `schema_id` / `category`
/// must be present.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRegistration {
    /// Endpoint to receive announcements.
    pub url: String,
    /// Subscribe to a concrete schema id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_id: Option<SchemaId>,
    /// Subscribe to an announcement category label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Acknowledgement of a webhook registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookAck {
    /// Always "REGISTERED".
    pub status: String,
}
