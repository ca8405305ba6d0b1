//! Decoding of raw on-chain schema payloads.
//!
//! The chain stores a schema's model as hex-encoded UTF-8 JSON. The JSON is
//! either a Parquet-style column list (`[{"name": ..., "column_type": ...}]`)
//! or an Avro record schema (`{"fields": [{"name": ..., "type": ...}]}`);
//! both reduce to an ordered field list for presence validation.

use crate::error::RegistryError;
use serde_json::Value;
use shared_types::{FieldDescriptor, SchemaId};

/// Decodes raw payload bytes into the schema's structural field list.
pub fn decode_schema_payload(
    schema_id: SchemaId,
    payload: &[u8],
) -> Result<Vec<FieldDescriptor>, RegistryError> {
    let malformed = |reason: String| RegistryError::SchemaMalformed { schema_id, reason };

    let hex_text = std::str::from_utf8(payload)
        .map_err(|e| malformed(format!("payload is not UTF-8: {e}")))?
        .trim();
    let hex_text = hex_text.strip_prefix("0x").unwrap_or(hex_text);

    let json_bytes =
        hex::decode(hex_text).map_err(|e| malformed(format!("payload is not hex: {e}")))?;
    let json_text = String::from_utf8(json_bytes)
        .map_err(|e| malformed(format!("decoded payload is not UTF-8: {e}")))?;
    let model: Value = serde_json::from_str(&json_text)
        .map_err(|e| malformed(format!("decoded payload is not JSON: {e}")))?;

    extract_fields(&model).ok_or_else(|| {
        malformed("model is neither a column list nor a record schema".to_string())
    })
}

/// Pulls `(name, type)` pairs out of either supported model shape.
fn extract_fields(model: &Value) -> Option<Vec<FieldDescriptor>> {
    let entries = match model {
        Value::Array(columns) => columns,
        Value::Object(object) => object.get("fields")?.as_array()?,
        _ => return None,
    };

    let mut fields = Vec::with_capacity(entries.len());
    for entry in entries {
        let name = entry.get("name")?.as_str()?.to_string();
        let field_type = entry
            .get("column_type")
            .or_else(|| entry.get("type"))
            .map(type_label);
        fields.push(FieldDescriptor { name, field_type });
    }
    Some(fields)
}

/// Renders a declared type as a label; complex Avro types keep their JSON.
fn type_label(declared: &Value) -> String {
    match declared {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
