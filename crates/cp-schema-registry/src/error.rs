//! Registry error types.
//!
//! `Clone` is required: in-flight resolutions are shared futures, and every
//! coalesced caller receives its own copy of the outcome.

use shared_types::SchemaId;
use thiserror::Error;

/// Schema resolution failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Schema id outside the valid `1..=65536` domain.
    #[error("schema id {0} is outside the valid domain 1..=65536")]
    InvalidSchemaId(i64),

    /// The upstream source has no schema under this id.
    #[error("schema {0} is not available upstream")]
    SchemaUnavailable(SchemaId),

    /// Upstream returned bytes that could not be decoded into a schema.
    #[error("schema {schema_id} payload is malformed: {reason}")]
    SchemaMalformed {
        /// Schema whose payload failed to decode.
        schema_id: SchemaId,
        /// Decoder's description of the failure.
        reason: String,
    },

    /// No published versions exist for a `(namespace, descriptor)` pair.
    #[error("no published versions for {namespace}.{descriptor}")]
    UnknownSchemaName {
        /// Requested namespace.
        namespace: String,
        /// Requested descriptor.
        descriptor: String,
    },

    /// The requested version is not among the published versions.
    #[error("version {version} of {namespace}.{descriptor} is not published")]
    UnknownSchemaVersion {
        /// Requested namespace.
        namespace: String,
        /// Requested descriptor.
        descriptor: String,
        /// Requested version.
        version: String,
    },

    /// Transport-level failure talking to the schema source.
    #[error("schema source failure: {0}")]
    Source(String),
}
