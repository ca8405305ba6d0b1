//! # Batch Ingest
//!
//! All-or-nothing acceptance of batch announcement uploads.
//!
//! ```text
//! BatchRequest ──→ count check ──→ per-item checks (concurrent) ──→ enqueue in order
//!                      │                  │
//!                      └── mismatch       └── any failure rejects the whole batch
//! ```
//!
//! Every item must pair a batchable schema with a structurally valid file
//! before anything is enqueued; a rejected batch leaves the queue untouched.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod error;
pub mod ingest;

pub use error::IngestError;
pub use ingest::{BatchAck, BatchIngest, BatchRequest};
