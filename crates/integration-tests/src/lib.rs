//! # Integration Tests
//!
//! Cross-crate flows that exercise the pipeline the way a deployment does:
//! an HTTP batch upload accepted by the gateway, carried through the queue,
//! processed by the worker pool, and fanned out to webhook subscribers.
//!
//! ```text
//! PUT batch ──→ gateway router ──→ batch ingest ──→ queue
//!                                                     │
//! recording webhook sender ←── announcer ←── worker pool
//! ```
//!
//! [`harness`] wires a full in-process stack with a recording webhook sender
//! in place of real HTTP; the flows live in `pipeline_flows`.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod harness;

#[cfg(test)]
mod pipeline_flows;
