//! In-process stack wiring for pipeline flows.

use async_trait::async_trait;
use axum::Router;
use cp_api_gateway::{router, AppState};
use cp_batch_ingest::BatchIngest;
use cp_content_validator::SchemaValidator;
use cp_job_worker::{WorkerConfig, WorkerPool, WorkerPoolHandle};
use cp_schema_registry::test_utils::{encode_schema_payload, parquet_info, MockSchemaSource};
use cp_schema_registry::{RegistryConfig, SchemaRegistry};
use cp_webhook_announcer::{
    InMemorySubscriberRegistry, SendError, WebhookAnnouncer, WebhookSender,
};
use parquet::file::properties::WriterProperties;
use parquet::file::writer::SerializedFileWriter;
use parquet::schema::parser::parse_message_type;
use shared_queue::{InMemoryJobQueue, JobQueue, JobStatus, QueueConfig};
use shared_types::{AnnouncementResponse, MockTimeSource, SchemaId};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// Schema id every harness registers as batchable Parquet.
pub const BROADCAST_SCHEMA_ID: SchemaId = 16_001;

const MODEL: &str = r#"[{"name":"announcementType","column_type":"INT32"},
                        {"name":"fromId","column_type":"BYTE_ARRAY"}]"#;

/// Webhook sender that records deliveries instead of posting them.
#[derive(Default)]
pub struct RecordingSender {
    deliveries: Mutex<Vec<(String, AnnouncementResponse)>>,
    /// Endpoints that always fail.
    blocked: Mutex<Vec<String>>,
    /// Number of leading calls that fail regardless of endpoint.
    fail_first: AtomicUsize,
    calls: AtomicUsize,
}

impl RecordingSender {
    /// Makes every delivery to `endpoint` fail.
    pub fn block(&self, endpoint: &str) {
        self.blocked.lock().unwrap().push(endpoint.to_string());
    }

    /// Makes the next `n` calls fail, then recover.
    pub fn fail_first(&self, n: usize) {
        self.fail_first.store(n, Ordering::SeqCst);
    }

    /// Successful deliveries in arrival order.
    pub fn deliveries(&self) -> Vec<(String, AnnouncementResponse)> {
        self.deliveries.lock().unwrap().clone()
    }

    /// Successful deliveries to one endpoint.
    pub fn deliveries_to(&self, endpoint: &str) -> Vec<AnnouncementResponse> {
        self.deliveries()
            .into_iter()
            .filter(|(e, _)| e == endpoint)
            .map(|(_, response)| response)
            .collect()
    }
}

#[async_trait]
impl WebhookSender for RecordingSender {
    async fn send(
        &self,
        endpoint: &str,
        response: &AnnouncementResponse,
    ) -> Result<(), SendError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.fail_first.load(Ordering::SeqCst) {
            return Err(SendError("injected transient failure".to_string()));
        }
        if self.blocked.lock().unwrap().iter().any(|b| b == endpoint) {
            return Err(SendError("injected endpoint failure".to_string()));
        }
        self.deliveries
            .lock()
            .unwrap()
            .push((endpoint.to_string(), response.clone()));
        Ok(())
    }
}

/// Full in-process pipeline: gateway router down to the recording sender.
pub struct PipelineHarness {
    pub router: Router,
    pub queue: Arc<InMemoryJobQueue>,
    pub subscribers: Arc<InMemorySubscriberRegistry>,
    pub sender: Arc<RecordingSender>,
    pub registry: Arc<SchemaRegistry>,
    pub pool: Option<WorkerPoolHandle>,
}

impl PipelineHarness {
    /// Builds the stack with instant retries and the default two workers.
    pub fn start() -> Self {
        Self::start_with(MockSchemaSource::new().with_schema(
            BROADCAST_SCHEMA_ID,
            parquet_info("dsnp", "broadcast", "v2"),
            encode_schema_payload(MODEL),
        ))
    }

    /// Builds the stack over a custom schema source.
    pub fn start_with(source: MockSchemaSource) -> Self {
        let registry = Arc::new(SchemaRegistry::new(
            Arc::new(source),
            Arc::new(MockTimeSource::new(1_000)),
            RegistryConfig::default(),
        ));
        let validator = Arc::new(SchemaValidator::new(Arc::clone(&registry)));
        let queue = Arc::new(InMemoryJobQueue::new(QueueConfig {
            max_attempts: 3,
            retry_backoff_ms: 0,
        }));
        let subscribers = Arc::new(InMemorySubscriberRegistry::new());
        let sender = Arc::new(RecordingSender::default());

        let announcer = Arc::new(WebhookAnnouncer::new(
            Arc::clone(&subscribers) as _,
            Arc::clone(&sender) as _,
        ));
        let pool = WorkerPool::spawn(Arc::clone(&queue), announcer, WorkerConfig::default());

        let ingest = Arc::new(BatchIngest::new(
            Arc::clone(&registry),
            validator,
            Arc::clone(&queue) as Arc<dyn JobQueue>,
        ));
        let state = AppState {
            ingest,
            search_queue: Arc::new(InMemoryJobQueue::new(QueueConfig::default())),
            subscribers: Arc::clone(&subscribers),
        };

        Self {
            router: router(state, 10 * 1024 * 1024),
            queue,
            subscribers,
            sender,
            registry,
            pool: Some(pool),
        }
    }

    /// Waits until the job reaches `wanted`, panicking after ~1s.
    pub async fn wait_for_status(&self, id: Uuid, wanted: JobStatus) {
        for _ in 0..200 {
            if self.queue.status(id) == Some(wanted) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("job {id} never reached {wanted:?}");
    }

    /// Stops the worker pool.
    pub async fn shutdown(mut self) {
        if let Some(pool) = self.pool.take() {
            pool.shutdown().await;
        }
    }
}

/// A structurally valid Parquet file for the harness schema.
pub fn valid_parquet_file() -> Vec<u8> {
    parquet_file(
        "message announcement {
            required int32 announcementType;
            required binary fromId (UTF8);
        }",
    )
}

/// An empty Parquet file with the given message schema.
pub fn parquet_file(message: &str) -> Vec<u8> {
    let schema = Arc::new(parse_message_type(message).expect("static message type"));
    let props = Arc::new(WriterProperties::builder().build());
    let mut buffer = Vec::new();
    let writer =
        SerializedFileWriter::new(&mut buffer, schema, props).expect("in-memory parquet writer");
    writer.close().expect("close parquet writer");
    buffer
}
