//! Batch rejection causes.
//!
//! Item-level variants carry the zero-based index of the offending file so
//! clients can correct a single entry and resubmit.

use cp_schema_registry::RegistryError;
use shared_queue::QueueError;
use shared_types::SchemaId;
use thiserror::Error;

/// Why a batch was rejected.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Files and schema ids must pair up one-to-one.
    #[error("batch has {files} file(s) but {schema_ids} schema id(s)")]
    CountMismatch {
        /// Number of uploaded files.
        files: usize,
        /// Number of supplied schema ids.
        schema_ids: usize,
    },

    /// A supplied schema id is outside the valid domain.
    #[error("item {index}: schema id {schema_id} is outside the valid domain 1..=65536")]
    InvalidSchemaId {
        /// Zero-based item index.
        index: usize,
        /// The out-of-domain id as supplied.
        schema_id: i64,
    },

    /// The schema exists but cannot be used for off-chain batches.
    #[error("item {index}: schema {schema_id} is not batchable")]
    NotBatchable {
        /// Zero-based item index.
        index: usize,
        /// The non-batchable schema id.
        schema_id: SchemaId,
    },

    /// The file failed structural validation against its schema.
    #[error("item {index}: file does not match the structure of schema {schema_id}")]
    ItemInvalid {
        /// Zero-based item index.
        index: usize,
        /// Schema the file was checked against.
        schema_id: SchemaId,
    },

    /// The schema could not be resolved.
    #[error("item {index}: {source}")]
    Schema {
        /// Zero-based item index.
        index: usize,
        /// Underlying resolution failure.
        #[source]
        source: RegistryError,
    },

    /// An accepted item could not be serialized for the queue.
    #[error("unable to serialize announcement payload: {0}")]
    Payload(String),

    /// The queue refused the batch.
    #[error(transparent)]
    Enqueue(#[from] QueueError),
}

impl IngestError {
    /// Whether the rejection is the client's to fix (as opposed to a
    /// service-side failure).
    pub fn is_client_fault(&self) -> bool {
        matches!(
            self,
            Self::CountMismatch { .. }
                | Self::InvalidSchemaId { .. }
                | Self::NotBatchable { .. }
                | Self::ItemInvalid { .. }
                | Self::Schema {
                    source: RegistryError::InvalidSchemaId(_) | RegistryError::SchemaUnavailable(_),
                    ..
                }
        )
    }
}
