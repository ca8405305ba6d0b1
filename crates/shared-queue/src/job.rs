//! Job and job-handle types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A queued unit of work carrying an opaque serialized payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Unique job identifier.
    pub id: Uuid,
    /// Serialized payload; the worker decides how to decode it.
    pub payload: Vec<u8>,
    /// Completed processing attempts so far.
    pub attempts: u32,
}

impl Job {
    /// Creates a fresh job with zero attempts.
    pub fn new(payload: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4(),
            payload,
            attempts: 0,
        }
    }
}

/// Acknowledgement returned to the producer at enqueue time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    /// Identifier of the enqueued job.
    pub id: Uuid,
}

/// Observable job state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// Waiting in the queue.
    Enqueued,
    /// Picked up by a worker.
    Processing,
    /// Processed successfully and removed.
    Delivered,
    /// Failed but eligible for another attempt.
    FailedRetryable,
    /// Failed permanently; routed to the dead-letter buffer.
    FailedTerminal,
}
