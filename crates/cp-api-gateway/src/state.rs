//! Shared handler state.

use cp_batch_ingest::BatchIngest;
use cp_webhook_announcer::InMemorySubscriberRegistry;
use shared_queue::JobQueue;
use std::sync::Arc;

/// Collaborators the route handlers dispatch into.
#[derive(Clone)]
pub struct AppState {
    /// Batch acceptance path.
    pub ingest: Arc<BatchIngest>,
    /// Queue for asynchronous block-range searches.
    pub search_queue: Arc<dyn JobQueue>,
    /// Webhook subscription registry.
    pub subscribers: Arc<InMemorySubscriberRegistry>,
}
