//! Structural validation of batch content against a resolved schema.

use crate::error::ValidationError;
use apache_avro::Schema as AvroSchema;
use bytes::Bytes;
use cp_schema_registry::SchemaRegistry;
use parquet::file::reader::{FileReader, SerializedFileReader};
use shared_types::{ModelType, SchemaDefinition, SchemaId};
use std::sync::Arc;
use tracing::warn;

/// Validates uploaded batch files against their registered schema.
pub struct SchemaValidator {
    registry: Arc<SchemaRegistry>,
}

impl SchemaValidator {
    /// Creates a validator resolving schemas through `registry`.
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self { registry }
    }

    /// Fail-closed verdict: `true` only when the schema resolves, every
    /// declared field is present in the file's structure, and every record
    /// in the file decodes.
    pub async fn validate(&self, schema_id: SchemaId, content: &[u8]) -> bool {
        match self.check(schema_id, content).await {
            Ok(()) => true,
            Err(error) => {
                warn!(schema_id, %error, "batch content failed structural validation");
                false
            }
        }
    }

    /// Same check as [`validate`](Self::validate), surfacing the cause.
    pub async fn check(&self, schema_id: SchemaId, content: &[u8]) -> Result<(), ValidationError> {
        let schema = self.registry.resolve_by_id(schema_id).await?;
        match schema.model {
            ModelType::Parquet => check_parquet(&schema, content),
            ModelType::AvroBinary => check_avro(&schema, content),
        }
    }
}

/// Checks that every declared field exists as a top-level Parquet column and
/// that every row decodes.
fn check_parquet(schema: &SchemaDefinition, content: &[u8]) -> Result<(), ValidationError> {
    let reader = SerializedFileReader::new(Bytes::copy_from_slice(content))
        .map_err(|e| ValidationError::UnreadableParquet(e.to_string()))?;

    let file_schema = reader.metadata().file_metadata().schema();
    let present: Vec<&str> = file_schema
        .get_fields()
        .iter()
        .map(|field| field.name())
        .collect();
    require_all(schema, &present)?;

    // A readable footer says nothing about the data pages; a file whose
    // records cannot be decoded is rejected like any other unreadable file.
    let rows = reader
        .get_row_iter(None)
        .map_err(|e| ValidationError::UnreadableParquet(e.to_string()))?;
    for row in rows {
        row.map_err(|e| ValidationError::UnreadableParquet(e.to_string()))?;
    }
    Ok(())
}

/// Checks that every declared field exists in the Avro writer schema and
/// that every value in the container decodes.
fn check_avro(schema: &SchemaDefinition, content: &[u8]) -> Result<(), ValidationError> {
    let reader = apache_avro::Reader::new(content)
        .map_err(|e| ValidationError::UnreadableAvro(e.to_string()))?;

    let AvroSchema::Record(record) = reader.writer_schema() else {
        return Err(ValidationError::AvroNotARecord);
    };
    let present: Vec<&str> = record.fields.iter().map(|f| f.name.as_str()).collect();
    require_all(schema, &present)?;

    for value in reader {
        value.map_err(|e| ValidationError::UnreadableAvro(e.to_string()))?;
    }
    Ok(())
}

fn require_all(schema: &SchemaDefinition, present: &[&str]) -> Result<(), ValidationError> {
    for field in &schema.fields {
        if !present.iter().any(|name| *name == field.name) {
            return Err(ValidationError::MissingField {
                name: field.name.clone(),
            });
        }
    }
    Ok(())
}
