//! Job queue contract and in-memory implementation.

use crate::config::QueueConfig;
use crate::job::{Job, JobHandle, JobStatus};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Queue-side failures surfaced to producers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// The queue no longer accepts jobs.
    #[error("queue is closed")]
    Closed,
}

/// Producer-facing contract of the durable queue.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueues a payload and returns its job handle.
    async fn enqueue(&self, payload: Vec<u8>) -> Result<JobHandle, QueueError>;
}

/// Single-process queue with bounded retries and a dead-letter buffer.
///
/// Dequeue removes a job from the channel; a failed job only re-enters via
/// [`InMemoryJobQueue::retry`], which applies the configured backoff and
/// attempt bound. Jobs that exhaust their attempts are dead-lettered for
/// investigation, mirroring a broker's DLQ.
pub struct InMemoryJobQueue {
    tx: Mutex<Option<mpsc::UnboundedSender<Job>>>,
    rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<Job>>,
    statuses: Arc<DashMap<Uuid, JobStatus>>,
    dead_letters: Arc<Mutex<Vec<Job>>>,
    config: QueueConfig,
}

impl InMemoryJobQueue {
    /// Creates an empty queue with the given retry policy.
    pub fn new(config: QueueConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx: Mutex::new(Some(tx)),
            rx: tokio::sync::Mutex::new(rx),
            statuses: Arc::new(DashMap::new()),
            dead_letters: Arc::new(Mutex::new(Vec::new())),
            config,
        }
    }

    /// Removes and returns the next job, or `None` once the queue is closed
    /// and drained.
    pub async fn dequeue(&self) -> Option<Job> {
        let mut rx = self.rx.lock().await;
        let job = rx.recv().await?;
        self.statuses.insert(job.id, JobStatus::Processing);
        Some(job)
    }

    /// Marks a job delivered.
    pub fn complete(&self, id: Uuid) {
        self.statuses.insert(id, JobStatus::Delivered);
        debug!(job_id = %id, "job delivered");
    }

    /// Hands a failed job back to the queue's retry policy.
    ///
    /// Re-enqueues after a backoff scaled by the attempt count, or routes the
    /// job to the dead-letter buffer once `max_attempts` is reached.
    pub async fn retry(&self, mut job: Job) {
        job.attempts += 1;

        if job.attempts >= self.config.max_attempts {
            warn!(
                job_id = %job.id,
                attempts = job.attempts,
                "job exhausted retry budget, dead-lettering"
            );
            self.dead_letter(job);
            return;
        }

        self.statuses.insert(job.id, JobStatus::FailedRetryable);
        let backoff = Duration::from_millis(self.config.retry_backoff_ms * u64::from(job.attempts));
        let sender = self.tx.lock().ok().and_then(|guard| guard.clone());
        let statuses = Arc::clone(&self.statuses);
        let dead_letters = Arc::clone(&self.dead_letters);

        tokio::spawn(async move {
            tokio::time::sleep(backoff).await;
            let id = job.id;
            match sender {
                Some(tx) if tx.send(job.clone()).is_ok() => {
                    statuses.insert(id, JobStatus::Enqueued);
                }
                _ => {
                    // Queue closed while the backoff ran.
                    statuses.insert(id, JobStatus::FailedTerminal);
                    if let Ok(mut dlq) = dead_letters.lock() {
                        dlq.push(job);
                    }
                }
            }
        });
    }

    /// Marks a job permanently failed without retrying.
    pub fn fail_terminal(&self, job: Job, reason: &str) {
        error!(job_id = %job.id, reason, "job failed terminally");
        self.dead_letter(job);
    }

    /// Current status of a job, if known.
    pub fn status(&self, id: Uuid) -> Option<JobStatus> {
        self.statuses.get(&id).map(|entry| *entry.value())
    }

    /// Number of dead-lettered jobs.
    pub fn dead_letter_count(&self) -> usize {
        self.dead_letters.lock().map(|dlq| dlq.len()).unwrap_or(0)
    }

    /// Stops accepting new jobs; workers drain what remains and then stop.
    pub fn close(&self) {
        if let Ok(mut guard) = self.tx.lock() {
            guard.take();
        }
    }

    fn dead_letter(&self, job: Job) {
        self.statuses.insert(job.id, JobStatus::FailedTerminal);
        if let Ok(mut dlq) = self.dead_letters.lock() {
            dlq.push(job);
        }
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn enqueue(&self, payload: Vec<u8>) -> Result<JobHandle, QueueError> {
        let job = Job::new(payload);
        let handle = JobHandle { id: job.id };
        let sender = self
            .tx
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
            .ok_or(QueueError::Closed)?;

        self.statuses.insert(job.id, JobStatus::Enqueued);
        sender.send(job).map_err(|_| QueueError::Closed)?;
        Ok(handle)
    }
}
