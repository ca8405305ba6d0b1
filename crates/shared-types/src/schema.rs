//! Schema identity, naming, and batchability rules.
//!
//! A schema is identified on-chain by a numeric id in `1..=65536` and resolves
//! to a `(namespace, descriptor, version)` triple. The derived full name uses
//! the format `namespace.descriptor@version`; a namespace never contains `.`
//! and a descriptor never contains `@`, so the full name parses back into its
//! components unambiguously.

use crate::time::Timestamp;
use serde::{Deserialize, Serialize};

/// Numeric schema identifier as recorded on-chain.
pub type SchemaId = u32;

/// Smallest valid schema id.
pub const SCHEMA_ID_MIN: SchemaId = 1;

/// Largest valid schema id.
pub const SCHEMA_ID_MAX: SchemaId = 65_536;

/// Where a schema's payload content is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PayloadLocation {
    /// Content stored on IPFS.
    #[serde(rename = "IPFS")]
    Ipfs,
    /// Content stored directly on-chain.
    OnChain,
    /// Content stored in itemized storage.
    Itemized,
    /// Content stored in paginated storage.
    Paginated,
}

/// Serialization format of a schema's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelType {
    /// Apache Parquet columnar format.
    Parquet,
    /// Avro binary container format.
    AvroBinary,
}

/// One field of a schema's structural description.
///
/// The declared type is carried through but not yet enforced; validation is
/// presence-only for this version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field name as it appears in uploaded records.
    pub name: String,
    /// Declared field type, when the schema supplies one.
    pub field_type: Option<String>,
}

/// Complete schema definition with metadata and batchability information.
///
/// Immutable once constructed; a fresh definition is built on every upstream
/// fetch and cached with its own TTL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    /// Schema id (1-65536).
    pub schema_id: SchemaId,
    /// Schema namespace (e.g. "dsnp").
    pub namespace: String,
    /// Schema descriptor (e.g. "broadcast").
    pub descriptor: String,
    /// Schema version (e.g. "v2").
    pub version: String,
    /// Derived full name, `namespace.descriptor@version`.
    pub full_name: String,
    /// Where the payload content is stored.
    pub payload_location: PayloadLocation,
    /// Payload serialization format.
    pub model: ModelType,
    /// Whether this schema may be aggregated into off-chain batch files.
    pub batchable: bool,
    /// When this definition was fetched, epoch milliseconds.
    pub fetched_at: Timestamp,
    /// Decoded structural description of the payload.
    pub fields: Vec<FieldDescriptor>,
}

impl SchemaDefinition {
    /// Constructs a definition from raw chain data, deriving `full_name` and
    /// `batchable`.
    pub fn new(
        schema_id: SchemaId,
        namespace: impl Into<String>,
        descriptor: impl Into<String>,
        version: impl Into<String>,
        payload_location: PayloadLocation,
        model: ModelType,
        fields: Vec<FieldDescriptor>,
        fetched_at: Timestamp,
    ) -> Self {
        let namespace = namespace.into();
        let descriptor = descriptor.into();
        let version = version.into();
        let full_name = build_schema_full_name(&namespace, &descriptor, &version);
        let batchable = is_schema_batchable(payload_location, model);

        Self {
            schema_id,
            namespace,
            descriptor,
            version,
            full_name,
            payload_location,
            model,
            batchable,
            fetched_at,
            fields,
        }
    }
}

/// Checks a (possibly signed) schema id against the valid domain `1..=65536`.
pub fn is_valid_schema_id(schema_id: i64) -> bool {
    schema_id >= i64::from(SCHEMA_ID_MIN) && schema_id <= i64::from(SCHEMA_ID_MAX)
}

/// Builds the full schema name `namespace.descriptor@version`.
pub fn build_schema_full_name(namespace: &str, descriptor: &str, version: &str) -> String {
    format!("{namespace}.{descriptor}@{version}")
}

/// Parses a full schema name back into `(namespace, descriptor, version)`.
///
/// The namespace ends at the first `.` and the descriptor at the first `@`;
/// hyphens are permitted in descriptors. Returns `None` for anything that does
/// not match `namespace.descriptor@version` with all parts non-empty.
pub fn parse_schema_full_name(full_name: &str) -> Option<(String, String, String)> {
    let (namespace, rest) = full_name.split_once('.')?;
    let (descriptor, version) = rest.split_once('@')?;

    if namespace.is_empty() || descriptor.is_empty() || version.is_empty() {
        return None;
    }

    Some((
        namespace.to_string(),
        descriptor.to_string(),
        version.to_string(),
    ))
}

/// A schema is batchable iff its payload lives on IPFS and its model supports
/// batch serialization (Parquet or Avro binary).
pub fn is_schema_batchable(payload_location: PayloadLocation, model: ModelType) -> bool {
    payload_location == PayloadLocation::Ipfs
        && matches!(model, ModelType::Parquet | ModelType::AvroBinary)
}
