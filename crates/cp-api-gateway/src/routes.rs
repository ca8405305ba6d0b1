//! Router and request handlers.

use crate::dto::{SearchAck, SearchRequest, WebhookAck, WebhookRegistration};
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use cp_batch_ingest::{BatchAck, BatchRequest};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

/// Category labels accepted by webhook registration.
const CATEGORIES: [&str; 7] = [
    "tombstone",
    "broadcast",
    "reply",
    "reaction",
    "profile",
    "update",
    "public_follows",
];

/// Builds the gateway router over the shared state.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/v3/content/batchAnnouncement", put(batch_announcement))
        .route("/v1/search", post(search))
        .route("/v1/webhook", post(register_webhook))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Accepts a multipart batch upload: repeated `files` parts, a `schemaIds`
/// JSON-array field, and an optional `fromId`.
async fn batch_announcement(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Vec<BatchAck>>), ApiError> {
    let mut files = Vec::new();
    let mut schema_ids: Option<Vec<i64>> = None;
    let mut from_id: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("files") => files.push(field.bytes().await?),
            Some("schemaIds") => {
                let text = field.text().await?;
                let ids = serde_json::from_str(&text).map_err(|e| {
                    ApiError::BadRequest(format!(
                        "schemaIds is not a JSON array of integers: {e}"
                    ))
                })?;
                schema_ids = Some(ids);
            }
            Some("fromId") => from_id = Some(field.text().await?),
            other => {
                debug!(
                    field = other.unwrap_or("<unnamed>"),
                    "ignoring unknown multipart field"
                );
            }
        }
    }

    let schema_ids = schema_ids
        .ok_or_else(|| ApiError::BadRequest("missing schemaIds field".to_string()))?;

    let request = BatchRequest {
        from_id: from_id.unwrap_or_else(|| "0".to_string()),
        files,
        schema_ids,
    };
    let acks = state.ingest.ingest(request).await?;
    Ok((StatusCode::ACCEPTED, Json(acks)))
}

/// Enqueues an asynchronous block-range search.
async fn search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchAck>, ApiError> {
    if request.block_count == 0 {
        return Err(ApiError::BadRequest("blockCount cannot be 0".to_string()));
    }

    let payload = serde_json::to_vec(&request).map_err(|e| ApiError::Internal(e.to_string()))?;
    let handle = state
        .search_queue
        .enqueue(payload)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    info!(job_id = %handle.id, block_count = request.block_count, "search enqueued");
    Ok(Json(SearchAck {
        status: "ENQUEUED".to_string(),
        job_id: handle.id,
    }))
}

/// Registers a webhook endpoint against a schema id and/or a category.
async fn register_webhook(
    State(state): State<AppState>,
    Json(registration): Json<WebhookRegistration>,
) -> Result<Json<WebhookAck>, ApiError> {
    if !registration.url.starts_with("http") {
        return Err(ApiError::BadRequest(
            "url must be an http(s) endpoint".to_string(),
        ));
    }
    if registration.schema_id.is_none() && registration.category.is_none() {
        return Err(ApiError::BadRequest(
            "registration needs a schemaId or a category".to_string(),
        ));
    }

    if let Some(schema_id) = registration.schema_id {
        state
            .subscribers
            .register_for_schema(schema_id, registration.url.clone());
    }
    if let Some(category) = &registration.category {
        if !CATEGORIES.contains(&category.as_str()) {
            return Err(ApiError::BadRequest(format!(
                "unknown category `{category}`"
            )));
        }
        state
            .subscribers
            .register_for_category(category.clone(), registration.url.clone());
    }

    info!(url = %registration.url, "webhook registered");
    Ok(Json(WebhookAck {
        status: "REGISTERED".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use cp_batch_ingest::BatchIngest;
    use cp_content_validator::SchemaValidator;
    use cp_schema_registry::test_utils::{
        encode_schema_payload, parquet_info, MockSchemaSource,
    };
    use cp_schema_registry::{RegistryConfig, SchemaRegistry};
    use cp_webhook_announcer::{InMemorySubscriberRegistry, SubscriberRegistry};
    use http_body_util::BodyExt;
    use parquet::file::properties::WriterProperties;
    use parquet::file::writer::SerializedFileWriter;
    use parquet::schema::parser::parse_message_type;
    use shared_queue::{InMemoryJobQueue, JobQueue, QueueConfig};
    use shared_types::MockTimeSource;
    use std::sync::Arc;
    use tower::ServiceExt;

    const MODEL: &str = r#"[{"name":"announcementType","column_type":"INT32"},
                            {"name":"fromId","column_type":"BYTE_ARRAY"}]"#;
    const BOUNDARY: &str = "gateway-test-boundary";

    fn test_router() -> (Router, Arc<InMemorySubscriberRegistry>) {
        let source = MockSchemaSource::new().with_schema(
            16_001,
            parquet_info("dsnp", "broadcast", "v2"),
            encode_schema_payload(MODEL),
        );
        let registry = Arc::new(SchemaRegistry::new(
            Arc::new(source),
            Arc::new(MockTimeSource::new(1_000)),
            RegistryConfig::default(),
        ));
        let validator = Arc::new(SchemaValidator::new(Arc::clone(&registry)));
        let queue: Arc<dyn JobQueue> = Arc::new(InMemoryJobQueue::new(QueueConfig::default()));
        let subscribers = Arc::new(InMemorySubscriberRegistry::new());

        let state = AppState {
            ingest: Arc::new(BatchIngest::new(registry, validator, queue)),
            search_queue: Arc::new(InMemoryJobQueue::new(QueueConfig::default())),
            subscribers: Arc::clone(&subscribers),
        };
        (router(state, 10 * 1024 * 1024), subscribers)
    }

    fn parquet_file() -> Vec<u8> {
        let schema = Arc::new(
            parse_message_type(
                "message announcement {
                    required int32 announcementType;
                    required binary fromId (UTF8);
                }",
            )
            .unwrap(),
        );
        let props = Arc::new(WriterProperties::builder().build());
        let mut buffer = Vec::new();
        let writer = SerializedFileWriter::new(&mut buffer, schema, props).unwrap();
        writer.close().unwrap();
        buffer
    }

    fn batch_request(
        files: &[Vec<u8>],
        schema_ids: Option<&str>,
        from_id: Option<&str>,
    ) -> Request<Body> {
        let mut body: Vec<u8> = Vec::new();
        for file in files {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; \
                     name=\"files\"; filename=\"batch.parquet\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(file);
            body.extend_from_slice(b"\r\n");
        }
        if let Some(ids) = schema_ids {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; \
                     name=\"schemaIds\"\r\n\r\n{ids}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some(from) = from_id {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; \
                     name=\"fromId\"\r\n\r\n{from}\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("PUT")
            .uri("/v3/content/batchAnnouncement")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_healthz() {
        let (router, _) = test_router();
        let response = router
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_valid_batch_accepted_with_acks() {
        let (router, _) = test_router();
        let file = parquet_file();
        let request = batch_request(
            &[file.clone(), file],
            Some("[16001, 16001]"),
            Some("614"),
        );

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let acks = body_json(response).await;
        let acks = acks.as_array().unwrap();
        assert_eq!(acks.len(), 2);
        assert_eq!(acks[0]["schemaId"], 16_001);
        assert!(acks[0]["jobId"].is_string());
    }

    #[tokio::test]
    async fn test_count_mismatch_is_unprocessable() {
        let (router, _) = test_router();
        let request = batch_request(&[parquet_file()], Some("[16001, 16001]"), None);
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_invalid_file_is_unprocessable() {
        let (router, _) = test_router();
        let request = batch_request(&[b"garbage".to_vec()], Some("[16001]"), None);
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("item 0"));
    }

    #[tokio::test]
    async fn test_missing_schema_ids_is_bad_request() {
        let (router, _) = test_router();
        let request = batch_request(&[parquet_file()], None, None);
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_schema_ids_is_bad_request() {
        let (router, _) = test_router();
        let request = batch_request(&[parquet_file()], Some("not json"), None);
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_search_enqueued() {
        let (router, _) = test_router();
        let response = router
            .oneshot(json_request(
                "POST",
                "/v1/search",
                json!({ "blockCount": 100, "upperBound": 5000 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "ENQUEUED");
        assert!(body["jobId"].is_string());
    }

    #[tokio::test]
    async fn test_search_zero_block_count_rejected() {
        let (router, _) = test_router();
        let response = router
            .oneshot(json_request(
                "POST",
                "/v1/search",
                json!({ "blockCount": 0 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_webhook_registration_by_category() {
        let (router, subscribers) = test_router();
        let response = router
            .oneshot(json_request(
                "POST",
                "/v1/webhook",
                json!({ "url": "https://a.example/hook", "category": "broadcast" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            subscribers.endpoints_for(1, "broadcast"),
            vec!["https://a.example/hook"]
        );
    }

    #[tokio::test]
    async fn test_webhook_registration_requires_a_target() {
        let (router, _) = test_router();
        let response = router
            .oneshot(json_request(
                "POST",
                "/v1/webhook",
                json!({ "url": "https://a.example/hook" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_webhook_registration_rejects_unknown_category() {
        let (router, _) = test_router();
        let response = router
            .oneshot(json_request(
                "POST",
                "/v1/webhook",
                json!({ "url": "https://a.example/hook", "category": "likes" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
