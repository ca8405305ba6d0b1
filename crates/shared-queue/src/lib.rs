//! # Shared Queue - Durable Job Queue Abstraction
//!
//! The pipeline's boundary to its durable queue collaborator. Producers see
//! only the [`JobQueue`] trait; the retry policy (bounded attempts, backoff,
//! dead-lettering) lives entirely on the queue side, never in the workers.
//!
//! ## Job lifecycle
//!
//! ```text
//! [ENQUEUED] ──dequeue──→ [PROCESSING] ──complete──→ [DELIVERED]
//!                               │
//!                               ├── retry (attempts < max) ──→ [ENQUEUED]
//!                               └── attempts exhausted ──────→ [FAILED] → DLQ
//! ```
//!
//! [`InMemoryJobQueue`] is the single-process implementation; a deployment
//! backed by a durable broker would implement the same contract.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod job;
pub mod queue;

pub use config::QueueConfig;
pub use job::{Job, JobHandle, JobStatus};
pub use queue::{InMemoryJobQueue, JobQueue, QueueError};
