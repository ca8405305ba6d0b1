//! The worker pool and per-job processing.

use crate::config::WorkerConfig;
use cp_webhook_announcer::Announce;
use shared_queue::{InMemoryJobQueue, Job};
use shared_types::AnnouncementResponse;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Fixed-size pool of workers draining the announcement queue.
pub struct WorkerPool;

/// Running pool; dropping it without [`shutdown`](Self::shutdown) leaves the
/// workers draining until the queue closes.
pub struct WorkerPoolHandle {
    shutdown_tx: broadcast::Sender<()>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `config.concurrency` workers over the queue and announcer.
    pub fn spawn(
        queue: Arc<InMemoryJobQueue>,
        announcer: Arc<dyn Announce>,
        config: WorkerConfig,
    ) -> WorkerPoolHandle {
        let (shutdown_tx, _) = broadcast::channel(1);
        info!(concurrency = config.concurrency, "starting worker pool");

        let workers = (0..config.concurrency)
            .map(|worker_id| {
                let queue = Arc::clone(&queue);
                let announcer = Arc::clone(&announcer);
                let mut shutdown = shutdown_tx.subscribe();
                tokio::spawn(async move {
                    loop {
                        tokio::select! {
                            _ = shutdown.recv() => {
                                debug!(worker_id, "worker stopping on shutdown");
                                break;
                            }
                            job = queue.dequeue() => match job {
                                Some(job) => process_job(&queue, announcer.as_ref(), job).await,
                                None => {
                                    debug!(worker_id, "queue closed and drained, worker stopping");
                                    break;
                                }
                            }
                        }
                    }
                })
            })
            .collect();

        WorkerPoolHandle {
            shutdown_tx,
            workers,
        }
    }
}

impl WorkerPoolHandle {
    /// Signals every worker to stop and waits for them to finish their
    /// current job.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        for worker in self.workers {
            let _ = worker.await;
        }
        info!("worker pool stopped");
    }
}

/// Processes one dequeued job to a final or retryable state.
async fn process_job(queue: &InMemoryJobQueue, announcer: &dyn Announce, job: Job) {
    let response: AnnouncementResponse = match serde_json::from_slice(&job.payload) {
        Ok(response) => response,
        Err(error) => {
            // Decoding is deterministic; retrying would fail identically.
            queue.fail_terminal(job, &format!("undecodable payload: {error}"));
            return;
        }
    };

    debug!(
        job_id = %job.id,
        schema_id = response.schema_id,
        category = response.announcement.category(),
        attempt = job.attempts,
        "processing announcement job"
    );

    match announcer.deliver(&response).await {
        Ok(report) => {
            debug!(job_id = %job.id, delivered = report.delivered, "job delivered");
            queue.complete(job.id);
        }
        Err(error) => {
            warn!(job_id = %job.id, %error, "delivery failed, handing job to retry policy");
            queue.retry(job).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cp_webhook_announcer::{DeliveryError, DeliveryReport, FailedDelivery};
    use shared_queue::{JobQueue, JobStatus, QueueConfig};
    use shared_types::Announcement;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use uuid::Uuid;

    /// Announcer failing the first `fail_first` deliveries, counting calls
    /// and tracking peak concurrency.
    #[derive(Default)]
    struct MockAnnouncer {
        fail_first: usize,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        peak_in_flight: AtomicUsize,
        delivery_delay: Option<Duration>,
    }

    impl MockAnnouncer {
        fn failing_first(fail_first: usize) -> Self {
            Self {
                fail_first,
                ..Self::default()
            }
        }

        fn slow(delay: Duration) -> Self {
            Self {
                delivery_delay: Some(delay),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl Announce for MockAnnouncer {
        async fn deliver(
            &self,
            _response: &AnnouncementResponse,
        ) -> Result<DeliveryReport, DeliveryError> {
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
            if let Some(delay) = self.delivery_delay {
                tokio::time::sleep(delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_first {
                return Err(DeliveryError {
                    attempted: 1,
                    failed: vec![FailedDelivery {
                        endpoint: "https://down.example/hook".to_string(),
                        reason: "connection refused".to_string(),
                    }],
                });
            }
            Ok(DeliveryReport { delivered: 1 })
        }
    }

    fn payload() -> Vec<u8> {
        serde_json::to_vec(&AnnouncementResponse {
            request_id: None,
            webhook_url: None,
            schema_id: 16_001,
            block_number: 0,
            announcement: Announcement::Broadcast {
                from_id: "614".to_string(),
                content_hash: "0xabc".to_string(),
                url: String::new(),
            },
        })
        .unwrap()
    }

    fn queue() -> Arc<InMemoryJobQueue> {
        Arc::new(InMemoryJobQueue::new(QueueConfig {
            max_attempts: 3,
            retry_backoff_ms: 0,
        }))
    }

    async fn wait_for_status(queue: &InMemoryJobQueue, id: Uuid, wanted: JobStatus) {
        for _ in 0..200 {
            if queue.status(id) == Some(wanted) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("job {id} never reached {wanted:?}");
    }

    #[tokio::test]
    async fn test_successful_job_marked_delivered() {
        let queue = queue();
        let announcer = Arc::new(MockAnnouncer::default());
        let pool = WorkerPool::spawn(
            Arc::clone(&queue),
            Arc::clone(&announcer) as _,
            WorkerConfig::default(),
        );

        let handle = queue.enqueue(payload()).await.unwrap();
        wait_for_status(&queue, handle.id, JobStatus::Delivered).await;
        assert_eq!(announcer.calls.load(Ordering::SeqCst), 1);
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_failed_delivery_retried_then_delivered() {
        let queue = queue();
        let announcer = Arc::new(MockAnnouncer::failing_first(1));
        let pool = WorkerPool::spawn(
            Arc::clone(&queue),
            Arc::clone(&announcer) as _,
            WorkerConfig::default(),
        );

        let handle = queue.enqueue(payload()).await.unwrap();
        wait_for_status(&queue, handle.id, JobStatus::Delivered).await;
        assert_eq!(announcer.calls.load(Ordering::SeqCst), 2);
        assert_eq!(queue.dead_letter_count(), 0);
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_persistent_failure_exhausts_retries_into_dlq() {
        let queue = queue();
        let announcer = Arc::new(MockAnnouncer::failing_first(usize::MAX));
        let pool = WorkerPool::spawn(
            Arc::clone(&queue),
            Arc::clone(&announcer) as _,
            WorkerConfig::default(),
        );

        let handle = queue.enqueue(payload()).await.unwrap();
        wait_for_status(&queue, handle.id, JobStatus::FailedTerminal).await;
        assert_eq!(queue.dead_letter_count(), 1);
        // First attempt plus the retries allowed by the policy.
        assert_eq!(announcer.calls.load(Ordering::SeqCst), 3);
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_undecodable_payload_fails_terminally_without_delivery() {
        let queue = queue();
        let announcer = Arc::new(MockAnnouncer::default());
        let pool = WorkerPool::spawn(
            Arc::clone(&queue),
            Arc::clone(&announcer) as _,
            WorkerConfig::default(),
        );

        let handle = queue.enqueue(b"not json".to_vec()).await.unwrap();
        wait_for_status(&queue, handle.id, JobStatus::FailedTerminal).await;
        assert_eq!(announcer.calls.load(Ordering::SeqCst), 0);
        assert_eq!(queue.dead_letter_count(), 1);
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_unknown_announcement_type_fails_terminally() {
        let queue = queue();
        let announcer = Arc::new(MockAnnouncer::default());
        let pool = WorkerPool::spawn(
            Arc::clone(&queue),
            Arc::clone(&announcer) as _,
            WorkerConfig::default(),
        );

        let bad = br#"{"schemaId":1,"blockNumber":0,"announcement":{"announcementType":7,"fromId":"1"}}"#;
        let handle = queue.enqueue(bad.to_vec()).await.unwrap();
        wait_for_status(&queue, handle.id, JobStatus::FailedTerminal).await;
        assert_eq!(announcer.calls.load(Ordering::SeqCst), 0);
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_two_workers_process_concurrently() {
        let queue = queue();
        let announcer = Arc::new(MockAnnouncer::slow(Duration::from_millis(100)));
        let pool = WorkerPool::spawn(
            Arc::clone(&queue),
            Arc::clone(&announcer) as _,
            WorkerConfig { concurrency: 2 },
        );

        let first = queue.enqueue(payload()).await.unwrap();
        let second = queue.enqueue(payload()).await.unwrap();
        wait_for_status(&queue, first.id, JobStatus::Delivered).await;
        wait_for_status(&queue, second.id, JobStatus::Delivered).await;

        assert_eq!(announcer.peak_in_flight.load(Ordering::SeqCst), 2);
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_stops_idle_workers() {
        let queue = queue();
        let pool = WorkerPool::spawn(
            Arc::clone(&queue),
            Arc::new(MockAnnouncer::default()),
            WorkerConfig::default(),
        );
        // Returns promptly even with nothing queued.
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_workers_drain_closed_queue_and_stop() {
        let queue = queue();
        let announcer = Arc::new(MockAnnouncer::default());
        let pool = WorkerPool::spawn(
            Arc::clone(&queue),
            Arc::clone(&announcer) as _,
            WorkerConfig { concurrency: 1 },
        );

        let handle = queue.enqueue(payload()).await.unwrap();
        queue.close();
        wait_for_status(&queue, handle.id, JobStatus::Delivered).await;

        // Workers observe the drained, closed queue and exit on their own.
        pool.shutdown().await;
    }
}
