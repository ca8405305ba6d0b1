//! End-to-end flows: HTTP upload to webhook delivery.

use crate::harness::{
    parquet_file, valid_parquet_file, PipelineHarness, BROADCAST_SCHEMA_ID,
};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use cp_schema_registry::test_utils::{encode_schema_payload, parquet_info, MockSchemaSource};
use http_body_util::BodyExt;
use shared_queue::JobStatus;
use shared_types::Announcement;
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

const BOUNDARY: &str = "pipeline-flow-boundary";

fn batch_upload(files: &[Vec<u8>], schema_ids: &str, from_id: &str) -> Request<Body> {
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
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; \
             name=\"schemaIds\"\r\n\r\n{schema_ids}\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; \
             name=\"fromId\"\r\n\r\n{from_id}\r\n"
        )
        .as_bytes(),
    );
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

async fn accepted_job_ids(response: axum::response::Response) -> Vec<Uuid> {
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let acks: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    acks.as_array()
        .unwrap()
        .iter()
        .map(|ack| Uuid::parse_str(ack["jobId"].as_str().unwrap()).unwrap())
        .collect()
}

#[tokio::test]
async fn test_batch_upload_reaches_subscribers() {
    let harness = PipelineHarness::start();
    harness
        .subscribers
        .register_for_schema(BROADCAST_SCHEMA_ID, "https://sub.example/hook");

    let file = valid_parquet_file();
    let response = harness
        .router
        .clone()
        .oneshot(batch_upload(
            &[file.clone(), file],
            "[16001, 16001]",
            "614",
        ))
        .await
        .unwrap();

    let job_ids = accepted_job_ids(response).await;
    assert_eq!(job_ids.len(), 2);
    for id in &job_ids {
        harness.wait_for_status(*id, JobStatus::Delivered).await;
    }

    let delivered = harness.sender.deliveries_to("https://sub.example/hook");
    assert_eq!(delivered.len(), 2);
    for response in &delivered {
        assert_eq!(response.schema_id, BROADCAST_SCHEMA_ID);
        assert_eq!(response.block_number, 0);
        match &response.announcement {
            Announcement::Broadcast {
                from_id,
                content_hash,
                ..
            } => {
                assert_eq!(from_id, "614");
                assert!(content_hash.starts_with("0x"));
            }
            other => panic!("expected broadcast, got {other:?}"),
        }
    }
    harness.shutdown().await;
}

#[tokio::test]
async fn test_category_subscription_also_receives() {
    let harness = PipelineHarness::start();
    harness
        .subscribers
        .register_for_category("broadcast", "https://cat.example/hook");

    let response = harness
        .router
        .clone()
        .oneshot(batch_upload(&[valid_parquet_file()], "[16001]", "614"))
        .await
        .unwrap();

    let job_ids = accepted_job_ids(response).await;
    harness
        .wait_for_status(job_ids[0], JobStatus::Delivered)
        .await;
    assert_eq!(
        harness.sender.deliveries_to("https://cat.example/hook").len(),
        1
    );
    harness.shutdown().await;
}

#[tokio::test]
async fn test_rejected_batch_delivers_nothing() {
    let harness = PipelineHarness::start();
    harness
        .subscribers
        .register_for_schema(BROADCAST_SCHEMA_ID, "https://sub.example/hook");

    let response = harness
        .router
        .clone()
        .oneshot(batch_upload(
            &[valid_parquet_file(), b"garbage".to_vec()],
            "[16001, 16001]",
            "614",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Give the workers a moment to prove there was nothing to process.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(harness.sender.deliveries().is_empty());
    assert_eq!(harness.queue.dead_letter_count(), 0);
    harness.shutdown().await;
}

#[tokio::test]
async fn test_transient_webhook_failure_retried_to_delivery() {
    let harness = PipelineHarness::start();
    harness
        .subscribers
        .register_for_schema(BROADCAST_SCHEMA_ID, "https://sub.example/hook");
    harness.sender.fail_first(1);

    let response = harness
        .router
        .clone()
        .oneshot(batch_upload(&[valid_parquet_file()], "[16001]", "614"))
        .await
        .unwrap();

    let job_ids = accepted_job_ids(response).await;
    harness
        .wait_for_status(job_ids[0], JobStatus::Delivered)
        .await;
    assert_eq!(
        harness.sender.deliveries_to("https://sub.example/hook").len(),
        1
    );
    assert_eq!(harness.queue.dead_letter_count(), 0);
    harness.shutdown().await;
}

#[tokio::test]
async fn test_dead_endpoint_never_starves_healthy_subscriber() {
    let harness = PipelineHarness::start();
    harness
        .subscribers
        .register_for_schema(BROADCAST_SCHEMA_ID, "https://up.example/hook");
    harness
        .subscribers
        .register_for_schema(BROADCAST_SCHEMA_ID, "https://down.example/hook");
    harness.sender.block("https://down.example/hook");

    let response = harness
        .router
        .clone()
        .oneshot(batch_upload(&[valid_parquet_file()], "[16001]", "614"))
        .await
        .unwrap();

    let job_ids = accepted_job_ids(response).await;
    // The dead endpoint fails every attempt, so the job exhausts its retries.
    harness
        .wait_for_status(job_ids[0], JobStatus::FailedTerminal)
        .await;
    assert_eq!(harness.queue.dead_letter_count(), 1);

    // The healthy subscriber received every at-least-once attempt.
    assert_eq!(
        harness.sender.deliveries_to("https://up.example/hook").len(),
        3
    );
    assert!(harness
        .sender
        .deliveries_to("https://down.example/hook")
        .is_empty());
    harness.shutdown().await;
}

#[tokio::test]
async fn test_concurrent_batch_items_share_one_schema_fetch() {
    let source = MockSchemaSource::new()
        .with_schema(
            BROADCAST_SCHEMA_ID,
            parquet_info("dsnp", "broadcast", "v2"),
            encode_schema_payload(
                r#"[{"name":"announcementType","column_type":"INT32"},
                    {"name":"fromId","column_type":"BYTE_ARRAY"}]"#,
            ),
        )
        .with_fetch_delay_ms(20);
    let counters = source.counters();
    let harness = PipelineHarness::start_with(source);

    let file = valid_parquet_file();
    let response = harness
        .router
        .clone()
        .oneshot(batch_upload(&[file.clone(), file], "[16001, 16001]", "614"))
        .await
        .unwrap();
    assert_eq!(accepted_job_ids(response).await.len(), 2);

    // Both items resolved the same uncached schema concurrently.
    assert_eq!(counters.payload_fetches(), 1);
    harness.shutdown().await;
}

#[tokio::test]
async fn test_unknown_schema_rejected_at_the_gate() {
    let harness = PipelineHarness::start();
    let response = harness
        .router
        .clone()
        .oneshot(batch_upload(
            &[parquet_file(
                "message announcement { required int32 announcementType; }",
            )],
            "[40000]",
            "614",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    harness.shutdown().await;
}
