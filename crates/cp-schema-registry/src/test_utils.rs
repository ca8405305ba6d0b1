//! Test doubles for the schema registry, shared with downstream crates.

use crate::source::{SchemaInfo, SchemaSource, SchemaVersionEntry, SourceError};
use async_trait::async_trait;
use shared_types::{ModelType, PayloadLocation, SchemaId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Encodes a JSON model the way the chain stores it: hex-encoded UTF-8.
pub fn encode_schema_payload(json: &str) -> Vec<u8> {
    hex::encode(json).into_bytes()
}

/// `SchemaInfo` for an IPFS + Parquet (batchable) schema.
pub fn parquet_info(namespace: &str, descriptor: &str, version: &str) -> SchemaInfo {
    SchemaInfo {
        namespace: namespace.to_string(),
        descriptor: descriptor.to_string(),
        version: version.to_string(),
        payload_location: PayloadLocation::Ipfs,
        model: ModelType::Parquet,
    }
}

/// `SchemaInfo` for an IPFS + Avro (batchable) schema.
pub fn avro_info(namespace: &str, descriptor: &str, version: &str) -> SchemaInfo {
    SchemaInfo {
        model: ModelType::AvroBinary,
        ..parquet_info(namespace, descriptor, version)
    }
}

/// `SchemaInfo` for an on-chain (non-batchable) schema.
pub fn on_chain_info(namespace: &str, descriptor: &str, version: &str) -> SchemaInfo {
    SchemaInfo {
        payload_location: PayloadLocation::OnChain,
        ..parquet_info(namespace, descriptor, version)
    }
}

/// Upstream call counts, shared with the test through [`Arc`]s.
#[derive(Debug, Clone, Default)]
pub struct MockSourceCounters {
    payload: Arc<AtomicUsize>,
    info: Arc<AtomicUsize>,
    versions: Arc<AtomicUsize>,
}

impl MockSourceCounters {
    /// Calls made to `get_schema_payload`.
    pub fn payload_fetches(&self) -> usize {
        self.payload.load(Ordering::SeqCst)
    }

    /// Calls made to `get_schema_info`.
    pub fn info_fetches(&self) -> usize {
        self.info.load(Ordering::SeqCst)
    }

    /// Calls made to `get_schema_versions`.
    pub fn version_fetches(&self) -> usize {
        self.versions.load(Ordering::SeqCst)
    }
}

/// In-memory [`SchemaSource`] with call counting, optional latency, and a
/// transport-failure toggle.
#[derive(Debug, Default)]
pub struct MockSchemaSource {
    schemas: HashMap<SchemaId, (SchemaInfo, Vec<u8>)>,
    counters: MockSourceCounters,
    fail_transport: Arc<AtomicBool>,
    fetch_delay: Option<Duration>,
}

impl MockSchemaSource {
    /// Creates an empty mock; every lookup resolves as absent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a schema under `schema_id`.
    pub fn with_schema(mut self, schema_id: SchemaId, info: SchemaInfo, payload: Vec<u8>) -> Self {
        self.schemas.insert(schema_id, (info, payload));
        self
    }

    /// Delays every upstream call, widening the race window for
    /// single-flight tests.
    pub fn with_fetch_delay_ms(mut self, ms: u64) -> Self {
        self.fetch_delay = Some(Duration::from_millis(ms));
        self
    }

    /// Handle to the upstream call counters.
    pub fn counters(&self) -> MockSourceCounters {
        self.counters.clone()
    }

    /// Flag that, while `true`, makes every call fail at the transport level.
    pub fn transport_toggle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.fail_transport)
    }

    async fn before_call(&self) -> Result<(), SourceError> {
        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_transport.load(Ordering::SeqCst) {
            return Err(SourceError("simulated transport failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SchemaSource for MockSchemaSource {
    async fn get_schema_payload(
        &self,
        schema_id: SchemaId,
    ) -> Result<Option<Vec<u8>>, SourceError> {
        self.before_call().await?;
        self.counters.payload.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .schemas
            .get(&schema_id)
            .map(|(_, payload)| payload.clone()))
    }

    async fn get_schema_info(&self, schema_id: SchemaId) -> Result<Option<SchemaInfo>, SourceError> {
        self.before_call().await?;
        self.counters.info.fetch_add(1, Ordering::SeqCst);
        Ok(self.schemas.get(&schema_id).map(|(info, _)| info.clone()))
    }

    async fn get_schema_versions(
        &self,
        namespace: &str,
        descriptor: &str,
    ) -> Result<Vec<SchemaVersionEntry>, SourceError> {
        self.before_call().await?;
        self.counters.versions.fetch_add(1, Ordering::SeqCst);

        let mut versions: Vec<(SchemaId, String)> = self
            .schemas
            .iter()
            .filter(|(_, (info, _))| info.namespace == namespace && info.descriptor == descriptor)
            .map(|(&schema_id, (info, _))| (schema_id, info.version.clone()))
            .collect();
        versions.sort_by_key(|(schema_id, _)| *schema_id);

        Ok(versions
            .into_iter()
            .map(|(schema_id, version)| SchemaVersionEntry { schema_id, version })
            .collect())
    }
}
