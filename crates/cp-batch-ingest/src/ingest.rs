//! Batch acceptance: validate every item, then enqueue in order.

use crate::error::IngestError;
use bytes::Bytes;
use cp_content_validator::SchemaValidator;
use cp_schema_registry::SchemaRegistry;
use futures::future::join_all;
use serde::Serialize;
use sha2::{Digest, Sha256};
use shared_queue::JobQueue;
use shared_types::{is_valid_schema_id, Announcement, AnnouncementResponse, SchemaId};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// One batch upload: files paired index-wise with their schema ids.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    /// DSNP user id publishing the batch.
    pub from_id: String,
    /// Uploaded batch files.
    pub files: Vec<Bytes>,
    /// Schema ids as supplied by the client, unchecked.
    pub schema_ids: Vec<i64>,
}

/// Acceptance receipt for one batch item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchAck {
    /// Queued job tracking the item.
    pub job_id: Uuid,
    /// Schema the item was accepted under.
    pub schema_id: SchemaId,
}

/// Accepts batch uploads with all-or-nothing semantics.
pub struct BatchIngest {
    registry: Arc<SchemaRegistry>,
    validator: Arc<SchemaValidator>,
    queue: Arc<dyn JobQueue>,
}

impl BatchIngest {
    /// Wires the ingestion path to its registry, validator, and queue.
    pub fn new(
        registry: Arc<SchemaRegistry>,
        validator: Arc<SchemaValidator>,
        queue: Arc<dyn JobQueue>,
    ) -> Self {
        Self {
            registry,
            validator,
            queue,
        }
    }

    /// Validates every item of the batch, then enqueues them in input order.
    ///
    /// Item checks run concurrently; on failure the lowest-index error is
    /// reported and nothing is enqueued.
    pub async fn ingest(&self, request: BatchRequest) -> Result<Vec<BatchAck>, IngestError> {
        if request.files.len() != request.schema_ids.len() {
            return Err(IngestError::CountMismatch {
                files: request.files.len(),
                schema_ids: request.schema_ids.len(),
            });
        }

        let checks = request
            .files
            .iter()
            .zip(request.schema_ids.iter().copied())
            .enumerate()
            .map(|(index, (file, raw_id))| self.check_item(index, &request.from_id, raw_id, file));

        let mut payloads = Vec::with_capacity(request.files.len());
        for outcome in join_all(checks).await {
            payloads.push(outcome?);
        }

        let mut acks = Vec::with_capacity(payloads.len());
        for (schema_id, payload) in payloads {
            let handle = self.queue.enqueue(payload).await?;
            acks.push(BatchAck {
                job_id: handle.id,
                schema_id,
            });
        }

        info!(
            from_id = %request.from_id,
            items = acks.len(),
            "batch accepted and enqueued"
        );
        Ok(acks)
    }

    async fn check_item(
        &self,
        index: usize,
        from_id: &str,
        raw_id: i64,
        file: &Bytes,
    ) -> Result<(SchemaId, Vec<u8>), IngestError> {
        if !is_valid_schema_id(raw_id) {
            return Err(IngestError::InvalidSchemaId {
                index,
                schema_id: raw_id,
            });
        }
        let schema_id = raw_id as SchemaId;

        let schema = self
            .registry
            .resolve_by_id(schema_id)
            .await
            .map_err(|source| IngestError::Schema { index, source })?;

        if !schema.batchable {
            return Err(IngestError::NotBatchable { index, schema_id });
        }

        if !self.validator.validate(schema_id, file).await {
            return Err(IngestError::ItemInvalid { index, schema_id });
        }

        let payload = build_announcement_payload(from_id, schema_id, file)?;
        Ok((schema_id, payload))
    }
}

/// Serializes the queued announcement for an accepted file.
///
/// The content hash is the hex SHA-256 of the file bytes; the block number
/// stays 0 until chain placement, and the URL is filled once the batch is
/// published off-chain.
fn build_announcement_payload(
    from_id: &str,
    schema_id: SchemaId,
    file: &Bytes,
) -> Result<Vec<u8>, IngestError> {
    let content_hash = format!("0x{}", hex::encode(Sha256::digest(file)));
    let response = AnnouncementResponse {
        request_id: Some(Uuid::new_v4().to_string()),
        webhook_url: None,
        schema_id,
        block_number: 0,
        announcement: Announcement::Broadcast {
            from_id: from_id.to_string(),
            content_hash,
            url: String::new(),
        },
    };
    serde_json::to_vec(&response).map_err(|e| IngestError::Payload(e.to_string()))
}
