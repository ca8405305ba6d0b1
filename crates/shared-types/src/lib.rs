//! # Shared Types - Content Pipeline Domain Model
//!
//! Data definitions shared by every pipeline subsystem:
//!
//! - `announcement` - the tagged-union DSNP announcement model that flows
//!   through the queue and out to webhook subscribers
//! - `schema` - schema identity, batchability rules, and the immutable
//!   [`SchemaDefinition`] resolved from the chain
//! - `cache` - time-bounded cache entries used by the schema registry
//! - `time` - the [`TimeSource`] abstraction for deterministic expiry tests
//!
//! The announcement wire discriminants (0, 2, 3, 4, 5, 6, 113) are protocol
//! constants and must never be renumbered.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod announcement;
pub mod cache;
pub mod schema;
pub mod time;

pub use announcement::{
    Announcement, AnnouncementDecodeError, AnnouncementResponse, AnnouncementType,
};
pub use cache::{SchemaCacheEntry, SchemaNameCacheEntry, DEFAULT_CACHE_TTL_SECONDS};
pub use schema::{
    build_schema_full_name, is_schema_batchable, is_valid_schema_id, parse_schema_full_name,
    FieldDescriptor, ModelType, PayloadLocation, SchemaDefinition, SchemaId, SCHEMA_ID_MAX,
    SCHEMA_ID_MIN,
};
pub use time::{MockTimeSource, SystemTimeSource, TimeSource, Timestamp};
