//! # Schema Registry
//!
//! Resolves numeric schema ids (and `namespace.descriptor@version` names) to
//! immutable [`shared_types::SchemaDefinition`]s, caching results with a
//! configurable TTL.
//!
//! ## Resolution path
//!
//! ```text
//! resolve ──→ cache hit (fresh) ──→ return cached definition
//!        └──→ miss / expired ──→ single-flight fetch ──→ decode ──→ cache ──→ return
//! ```
//!
//! Concurrent resolutions of the same uncached id are coalesced: exactly one
//! upstream call is issued and every concurrent caller observes its result.
//! Failures are never cached, so the next call retries upstream.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod decode;
pub mod error;
pub mod registry;
pub mod source;
pub mod test_utils;

pub use config::RegistryConfig;
pub use decode::decode_schema_payload;
pub use error::RegistryError;
pub use registry::SchemaRegistry;
pub use source::{SchemaInfo, SchemaSource, SchemaVersionEntry, SourceError, StaticSchemaSource};
