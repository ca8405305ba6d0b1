//! The schema registry: TTL cache plus single-flight upstream fetches.

use crate::config::RegistryConfig;
use crate::decode::decode_schema_payload;
use crate::error::RegistryError;
use crate::source::SchemaSource;
use dashmap::DashMap;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use shared_types::{
    build_schema_full_name, is_valid_schema_id, SchemaCacheEntry, SchemaDefinition, SchemaId,
    SchemaNameCacheEntry, TimeSource, Timestamp,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Sentinel version used to index "most recently published" name lookups.
const LATEST_VERSION_KEY: &str = "latest";

type ResolveFuture = Shared<BoxFuture<'static, Result<SchemaDefinition, RegistryError>>>;
type NameResolveFuture = Shared<BoxFuture<'static, Result<SchemaId, RegistryError>>>;

/// Resolves schema ids and names to cached [`SchemaDefinition`]s.
///
/// The cache is passive: entries carry their expiry and are checked on every
/// read; stale entries linger until overwritten. Concurrent resolutions of
/// one uncached key — id or name — share a single upstream fetch, and fetch
/// failures are never cached.
pub struct SchemaRegistry {
    source: Arc<dyn SchemaSource>,
    time: Arc<dyn TimeSource>,
    config: RegistryConfig,
    by_id: Arc<DashMap<SchemaId, SchemaCacheEntry>>,
    by_name: Arc<DashMap<String, SchemaNameCacheEntry>>,
    in_flight: Mutex<HashMap<SchemaId, ResolveFuture>>,
    name_in_flight: Mutex<HashMap<String, NameResolveFuture>>,
}

impl SchemaRegistry {
    /// Creates a registry over the given schema source and clock.
    pub fn new(
        source: Arc<dyn SchemaSource>,
        time: Arc<dyn TimeSource>,
        config: RegistryConfig,
    ) -> Self {
        Self {
            source,
            time,
            config,
            by_id: Arc::new(DashMap::new()),
            by_name: Arc::new(DashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
            name_in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Resolves a schema id to its definition, fetching upstream on a cache
    /// miss or expired entry.
    pub async fn resolve_by_id(
        &self,
        schema_id: SchemaId,
    ) -> Result<SchemaDefinition, RegistryError> {
        if !is_valid_schema_id(i64::from(schema_id)) {
            return Err(RegistryError::InvalidSchemaId(i64::from(schema_id)));
        }

        let now = self.time.now();
        if let Some(entry) = self.by_id.get(&schema_id) {
            if !entry.is_expired(now) {
                return Ok(entry.schema.clone());
            }
        }

        // Coalesce concurrent misses onto one shared fetch.
        let (fetch, owner) = {
            let mut in_flight = self
                .in_flight
                .lock()
                .map_err(|_| RegistryError::Source("in-flight lock poisoned".to_string()))?;

            match in_flight.get(&schema_id) {
                Some(existing) => (existing.clone(), false),
                None => {
                    let fetch = Self::fetch_and_cache(
                        Arc::clone(&self.source),
                        Arc::clone(&self.time),
                        self.config.clone(),
                        Arc::clone(&self.by_id),
                        Arc::clone(&self.by_name),
                        schema_id,
                    )
                    .boxed()
                    .shared();
                    in_flight.insert(schema_id, fetch.clone());
                    (fetch, true)
                }
            }
        };

        let result = fetch.await;
        if owner {
            if let Ok(mut in_flight) = self.in_flight.lock() {
                in_flight.remove(&schema_id);
            }
        }
        result
    }

    /// Resolves a name triple to its definition. Without an explicit version
    /// the most recently published version of the pair is chosen, via the
    /// name index when fresh.
    pub async fn resolve_by_name(
        &self,
        namespace: &str,
        descriptor: &str,
        version: Option<&str>,
    ) -> Result<SchemaDefinition, RegistryError> {
        let index_key =
            build_schema_full_name(namespace, descriptor, version.unwrap_or(LATEST_VERSION_KEY));

        let now = self.time.now();
        if let Some(entry) = self.by_name.get(&index_key) {
            if !entry.is_expired(now) {
                let schema_id = entry.schema_id;
                drop(entry);
                return self.resolve_by_id(schema_id).await;
            }
        }

        // The version lookup follows the same single-flight discipline as
        // by-id misses, keyed by the index name.
        let (fetch, owner) = {
            let mut in_flight = self
                .name_in_flight
                .lock()
                .map_err(|_| RegistryError::Source("in-flight lock poisoned".to_string()))?;

            match in_flight.get(&index_key) {
                Some(existing) => (existing.clone(), false),
                None => {
                    let fetch = Self::fetch_version_and_index(
                        Arc::clone(&self.source),
                        Arc::clone(&self.time),
                        self.config.clone(),
                        Arc::clone(&self.by_name),
                        index_key.clone(),
                        namespace.to_string(),
                        descriptor.to_string(),
                        version.map(str::to_string),
                    )
                    .boxed()
                    .shared();
                    in_flight.insert(index_key.clone(), fetch.clone());
                    (fetch, true)
                }
            }
        };

        let resolved = fetch.await;
        if owner {
            if let Ok(mut in_flight) = self.name_in_flight.lock() {
                in_flight.remove(&index_key);
            }
        }
        self.resolve_by_id(resolved?).await
    }

    /// Number of definitions currently held (fresh or stale).
    pub fn cached_schema_count(&self) -> usize {
        self.by_id.len()
    }

    #[allow(clippy::too_many_arguments)]
    async fn fetch_version_and_index(
        source: Arc<dyn SchemaSource>,
        time: Arc<dyn TimeSource>,
        config: RegistryConfig,
        by_name: Arc<DashMap<String, SchemaNameCacheEntry>>,
        index_key: String,
        namespace: String,
        descriptor: String,
        version: Option<String>,
    ) -> Result<SchemaId, RegistryError> {
        debug!(%index_key, "schema name index miss, fetching versions upstream");

        let versions = source
            .get_schema_versions(&namespace, &descriptor)
            .await
            .map_err(|e| RegistryError::Source(e.to_string()))?;

        let Some(newest) = versions.last() else {
            return Err(RegistryError::UnknownSchemaName {
                namespace,
                descriptor,
            });
        };

        let schema_id = match version {
            Some(requested) => versions
                .iter()
                .find(|entry| entry.version == requested)
                .map(|entry| entry.schema_id)
                .ok_or(RegistryError::UnknownSchemaVersion {
                    namespace,
                    descriptor,
                    version: requested,
                })?,
            None => newest.schema_id,
        };

        let now = time.now();
        by_name.insert(
            index_key.clone(),
            SchemaNameCacheEntry::new(index_key, schema_id, config.cache_ttl_seconds, now),
        );
        Ok(schema_id)
    }

    async fn fetch_and_cache(
        source: Arc<dyn SchemaSource>,
        time: Arc<dyn TimeSource>,
        config: RegistryConfig,
        by_id: Arc<DashMap<SchemaId, SchemaCacheEntry>>,
        by_name: Arc<DashMap<String, SchemaNameCacheEntry>>,
        schema_id: SchemaId,
    ) -> Result<SchemaDefinition, RegistryError> {
        debug!(schema_id, "schema cache miss, fetching upstream");

        let info = source
            .get_schema_info(schema_id)
            .await
            .map_err(|e| RegistryError::Source(e.to_string()))?
            .ok_or(RegistryError::SchemaUnavailable(schema_id))?;

        let payload = source
            .get_schema_payload(schema_id)
            .await
            .map_err(|e| RegistryError::Source(e.to_string()))?
            .ok_or(RegistryError::SchemaUnavailable(schema_id))?;

        let fields = decode_schema_payload(schema_id, &payload)?;

        let now = time.now();
        let schema = SchemaDefinition::new(
            schema_id,
            info.namespace,
            info.descriptor,
            info.version,
            info.payload_location,
            info.model,
            fields,
            now,
        );

        prune_expired(&by_id, now, config.max_entries);
        by_id.insert(
            schema_id,
            SchemaCacheEntry::new(schema.clone(), config.cache_ttl_seconds, now),
        );
        by_name.insert(
            schema.full_name.clone(),
            SchemaNameCacheEntry::new(
                schema.full_name.clone(),
                schema_id,
                config.cache_ttl_seconds,
                now,
            ),
        );

        debug!(schema_id, full_name = %schema.full_name, batchable = schema.batchable, "schema cached");
        Ok(schema)
    }
}

/// Drops expired entries once the cache would exceed its bound.
fn prune_expired(
    by_id: &DashMap<SchemaId, SchemaCacheEntry>,
    now: Timestamp,
    max_entries: usize,
) {
    if by_id.len() < max_entries {
        return;
    }
    by_id.retain(|_, entry| !entry.is_expired(now));
    if by_id.len() >= max_entries {
        warn!(
            entries = by_id.len(),
            max_entries, "schema cache over capacity with no expired entries to prune"
        );
    }
}
