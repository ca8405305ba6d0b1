//! # API Gateway
//!
//! HTTP surface of the content announcement pipeline.
//!
//! ```text
//! PUT  /v3/content/batchAnnouncement ──→ batch ingest ──→ announcement queue
//! POST /v1/search                    ──→ search queue
//! POST /v1/webhook                   ──→ subscriber registry
//! GET  /healthz                      ──→ liveness
//! ```
//!
//! The gateway is a thin marshaling layer: multipart and JSON bodies are
//! decoded here, every decision is made by the crates behind it.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use config::{GatewayConfig, GatewayConfigError};
pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
