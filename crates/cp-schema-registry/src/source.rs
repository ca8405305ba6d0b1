//! Outbound port to the blockchain schema source.
//!
//! Absence and transport failure are kept distinct: `Ok(None)` means the
//! chain has nothing under that id, `Err` means we could not ask. An absent
//! schema must never surface as a parsed empty schema.

use async_trait::async_trait;
use serde::Deserialize;
use shared_types::{ModelType, PayloadLocation, SchemaId};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Transport-level failure talking to the chain.
#[derive(Debug, Clone, Error)]
#[error("schema source transport failure: {0}")]
pub struct SourceError(pub String);

/// Identifying metadata for a schema id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaInfo {
    /// Schema namespace.
    pub namespace: String,
    /// Schema descriptor.
    pub descriptor: String,
    /// Schema version.
    pub version: String,
    /// Where the payload content is stored.
    pub payload_location: PayloadLocation,
    /// Payload serialization format.
    pub model: ModelType,
}

/// One published version of a `(namespace, descriptor)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaVersionEntry {
    /// Schema id of this version.
    pub schema_id: SchemaId,
    /// Version string.
    pub version: String,
}

/// Read-only access to schema data recorded on-chain.
#[async_trait]
pub trait SchemaSource: Send + Sync {
    /// Raw schema model payload (hex-encoded UTF-8 JSON), or `None` if the
    /// chain has no schema under this id.
    async fn get_schema_payload(&self, schema_id: SchemaId)
        -> Result<Option<Vec<u8>>, SourceError>;

    /// Identifying triple plus storage metadata, or `None` if unknown.
    async fn get_schema_info(&self, schema_id: SchemaId) -> Result<Option<SchemaInfo>, SourceError>;

    /// Published versions of a name pair, ordered oldest to newest. An empty
    /// list means the pair is unknown.
    async fn get_schema_versions(
        &self,
        namespace: &str,
        descriptor: &str,
    ) -> Result<Vec<SchemaVersionEntry>, SourceError>;
}

/// Schema source backed by a fixed, preloaded set of schemas.
///
/// Covers deployments that pin their supported schemas at startup instead of
/// discovering them live; also the seam for wiring well-known DSNP schemas
/// from a manifest file.
#[derive(Debug, Default)]
pub struct StaticSchemaSource {
    schemas: HashMap<SchemaId, (SchemaInfo, Vec<u8>)>,
}

/// One manifest record for [`StaticSchemaSource::from_manifest_file`].
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManifestEntry {
    schema_id: SchemaId,
    namespace: String,
    descriptor: String,
    version: String,
    payload_location: PayloadLocation,
    model: ModelType,
    /// Hex-encoded UTF-8 JSON model, exactly as stored on-chain.
    payload_hex: String,
}

/// Failure loading a schema manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest file could not be read.
    #[error("unable to read schema manifest: {0}")]
    Io(String),
    /// The manifest JSON could not be parsed.
    #[error("unable to parse schema manifest: {0}")]
    Parse(String),
}

impl StaticSchemaSource {
    /// Creates an empty source; every lookup resolves as absent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a schema with its raw on-chain payload bytes.
    pub fn with_schema(mut self, schema_id: SchemaId, info: SchemaInfo, payload: Vec<u8>) -> Self {
        self.schemas.insert(schema_id, (info, payload));
        self
    }

    /// Loads a JSON manifest of preloaded schemas.
    pub fn from_manifest_file(path: &Path) -> Result<Self, ManifestError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ManifestError::Io(e.to_string()))?;
        let entries: Vec<ManifestEntry> =
            serde_json::from_str(&raw).map_err(|e| ManifestError::Parse(e.to_string()))?;

        let mut source = Self::new();
        for entry in entries {
            let info = SchemaInfo {
                namespace: entry.namespace,
                descriptor: entry.descriptor,
                version: entry.version,
                payload_location: entry.payload_location,
                model: entry.model,
            };
            source = source.with_schema(entry.schema_id, info, entry.payload_hex.into_bytes());
        }
        Ok(source)
    }
}

#[async_trait]
impl SchemaSource for StaticSchemaSource {
    async fn get_schema_payload(
        &self,
        schema_id: SchemaId,
    ) -> Result<Option<Vec<u8>>, SourceError> {
        Ok(self
            .schemas
            .get(&schema_id)
            .map(|(_, payload)| payload.clone()))
    }

    async fn get_schema_info(&self, schema_id: SchemaId) -> Result<Option<SchemaInfo>, SourceError> {
        Ok(self.schemas.get(&schema_id).map(|(info, _)| info.clone()))
    }

    async fn get_schema_versions(
        &self,
        namespace: &str,
        descriptor: &str,
    ) -> Result<Vec<SchemaVersionEntry>, SourceError> {
        let mut versions: Vec<(SchemaId, String)> = self
            .schemas
            .iter()
            .filter(|(_, (info, _))| info.namespace == namespace && info.descriptor == descriptor)
            .map(|(&schema_id, (info, _))| (schema_id, info.version.clone()))
            .collect();

        // Publication order on-chain is ascending schema id.
        versions.sort_by_key(|(schema_id, _)| *schema_id);

        Ok(versions
            .into_iter()
            .map(|(schema_id, version)| SchemaVersionEntry { schema_id, version })
            .collect())
    }
}
