//! Time-bounded cache entries for schema resolution.
//!
//! Expiry is passive: entries carry their own `expires_at` and are checked on
//! every read. The boundary is inclusive, so an entry whose expiry equals the
//! current instant is already expired.

use crate::schema::{SchemaDefinition, SchemaId};
use crate::time::Timestamp;

/// Default cache TTL in seconds (one hour).
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 3_600;

/// Cache entry for schema lookup by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaCacheEntry {
    /// The cached schema definition.
    pub schema: SchemaDefinition,
    /// Expiry timestamp, epoch milliseconds.
    pub expires_at: Timestamp,
}

impl SchemaCacheEntry {
    /// Creates an entry expiring `ttl_seconds` after `now`.
    pub fn new(schema: SchemaDefinition, ttl_seconds: u64, now: Timestamp) -> Self {
        Self {
            schema,
            expires_at: now + ttl_seconds * 1_000,
        }
    }

    /// True iff the entry has expired at `now` (inclusive boundary).
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }
}

/// Cache entry for a full-name to schema-id resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaNameCacheEntry {
    /// Full schema name, `namespace.descriptor@version`.
    pub full_name: String,
    /// Resolved schema id.
    pub schema_id: SchemaId,
    /// Expiry timestamp, epoch milliseconds.
    pub expires_at: Timestamp,
}

impl SchemaNameCacheEntry {
    /// Creates an entry expiring `ttl_seconds` after `now`.
    pub fn new(
        full_name: impl Into<String>,
        schema_id: SchemaId,
        ttl_seconds: u64,
        now: Timestamp,
    ) -> Self {
        Self {
            full_name: full_name.into(),
            schema_id,
            expires_at: now + ttl_seconds * 1_000,
        }
    }

    /// True iff the entry has expired at `now` (inclusive boundary).
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }
}
