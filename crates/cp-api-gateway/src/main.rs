//! Content gateway binary: wires the pipeline and serves the HTTP surface.

use cp_api_gateway::{routes, AppState, GatewayConfig};
use cp_batch_ingest::BatchIngest;
use cp_content_validator::SchemaValidator;
use cp_job_worker::{WorkerConfig, WorkerPool};
use cp_schema_registry::{RegistryConfig, SchemaRegistry, SchemaSource, StaticSchemaSource};
use cp_webhook_announcer::{HttpWebhookSender, InMemorySubscriberRegistry, WebhookAnnouncer};
use shared_queue::{InMemoryJobQueue, JobQueue, QueueConfig};
use shared_types::SystemTimeSource;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = GatewayConfig::from_env();
    config.validate()?;
    let registry_config = RegistryConfig::from_env();
    registry_config.validate()?;
    let queue_config = QueueConfig::from_env();
    queue_config.validate()?;
    let worker_config = WorkerConfig::from_env();
    worker_config.validate()?;

    // Supported schemas are pinned at startup via an optional manifest.
    let source: Arc<dyn SchemaSource> = match std::env::var("SCHEMA_MANIFEST") {
        Ok(path) => {
            info!(path, "loading schema manifest");
            Arc::new(StaticSchemaSource::from_manifest_file(Path::new(&path))?)
        }
        Err(_) => Arc::new(StaticSchemaSource::new()),
    };

    let registry = Arc::new(SchemaRegistry::new(
        source,
        Arc::new(SystemTimeSource),
        registry_config,
    ));
    let validator = Arc::new(SchemaValidator::new(Arc::clone(&registry)));

    let queue = Arc::new(InMemoryJobQueue::new(queue_config.clone()));
    let search_queue = Arc::new(InMemoryJobQueue::new(queue_config));
    let subscribers = Arc::new(InMemorySubscriberRegistry::new());

    let sender = Arc::new(HttpWebhookSender::new(config.webhook_timeout_ms)?);
    let announcer = Arc::new(WebhookAnnouncer::new(
        Arc::clone(&subscribers) as _,
        sender,
    ));
    let pool = WorkerPool::spawn(Arc::clone(&queue), announcer, worker_config);

    let ingest = Arc::new(BatchIngest::new(
        registry,
        validator,
        Arc::clone(&queue) as Arc<dyn JobQueue>,
    ));

    let state = AppState {
        ingest,
        search_queue: search_queue as Arc<dyn JobQueue>,
        subscribers,
    };
    let app = routes::router(state, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!(addr = %listener.local_addr()?, "content gateway listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop accepting work, let the workers drain what was queued.
    queue.close();
    pool.shutdown().await;
    info!("content gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
