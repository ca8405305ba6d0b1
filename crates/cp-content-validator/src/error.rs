//! Validation failure causes.

use cp_schema_registry::RegistryError;
use thiserror::Error;

/// Why a batch file failed structural validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The schema itself could not be resolved.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The file is not readable as Parquet.
    #[error("content is not a readable Parquet file: {0}")]
    UnreadableParquet(String),

    /// The file is not readable as Avro.
    #[error("content is not a readable Avro file: {0}")]
    UnreadableAvro(String),

    /// The Avro writer schema is not a record, so it has no fields to check.
    #[error("avro writer schema is not a record")]
    AvroNotARecord,

    /// A field the schema declares is absent from the file's structure.
    #[error("file structure is missing required field `{name}`")]
    MissingField {
        /// Name of the absent field.
        name: String,
    },
}
