//! # Job Worker
//!
//! Pulls queued announcement jobs and hands them to the webhook announcer,
//! with a fixed number of concurrent workers.
//!
//! ```text
//! queue ──dequeue──→ worker 1..N ──decode──→ announcer.deliver
//!                        │                        │
//!                        │ undecodable            │ delivery failed
//!                        └──→ fail terminal       └──→ queue.retry
//! ```
//!
//! Failure handling is split: a payload that cannot be decoded will never
//! succeed and is failed terminally; a delivery failure is handed back to
//! the queue's retry policy.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod worker;

pub use config::{WorkerConfig, WorkerConfigError};
pub use worker::{WorkerPool, WorkerPoolHandle};
