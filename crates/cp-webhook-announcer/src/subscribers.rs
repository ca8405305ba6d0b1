//! Webhook subscription bookkeeping.
//!
//! Subscribers register either against a concrete schema id or against an
//! announcement category label ("broadcast", "reaction", ...). Resolution
//! unions both and deduplicates, so a subscriber registered twice receives
//! one delivery.

use dashmap::DashMap;
use shared_types::SchemaId;

/// Lookup of webhook endpoints interested in an announcement.
pub trait SubscriberRegistry: Send + Sync {
    /// Endpoints subscribed to this schema id or category, deduplicated,
    /// in registration order.
    fn endpoints_for(&self, schema_id: SchemaId, category: &str) -> Vec<String>;
}

/// In-process subscriber registry.
#[derive(Debug, Default)]
pub struct InMemorySubscriberRegistry {
    by_schema: DashMap<SchemaId, Vec<String>>,
    by_category: DashMap<String, Vec<String>>,
}

impl InMemorySubscriberRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes `endpoint` to announcements under a schema id.
    pub fn register_for_schema(&self, schema_id: SchemaId, endpoint: impl Into<String>) {
        let endpoint = endpoint.into();
        let mut endpoints = self.by_schema.entry(schema_id).or_default();
        if !endpoints.contains(&endpoint) {
            endpoints.push(endpoint);
        }
    }

    /// Subscribes `endpoint` to announcements of a category.
    pub fn register_for_category(&self, category: impl Into<String>, endpoint: impl Into<String>) {
        let endpoint = endpoint.into();
        let mut endpoints = self.by_category.entry(category.into()).or_default();
        if !endpoints.contains(&endpoint) {
            endpoints.push(endpoint);
        }
    }
}

impl SubscriberRegistry for InMemorySubscriberRegistry {
    fn endpoints_for(&self, schema_id: SchemaId, category: &str) -> Vec<String> {
        let mut endpoints: Vec<String> = Vec::new();
        if let Some(by_schema) = self.by_schema.get(&schema_id) {
            endpoints.extend(by_schema.iter().cloned());
        }
        if let Some(by_category) = self.by_category.get(category) {
            for endpoint in by_category.iter() {
                if !endpoints.contains(endpoint) {
                    endpoints.push(endpoint.clone());
                }
            }
        }
        endpoints
    }
}
