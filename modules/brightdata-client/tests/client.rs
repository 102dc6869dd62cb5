//! HTTP-level tests for `BrightDataClient` and the poller on top of it.
//!
//! Each test stands up a `wiremock` server so no real network traffic is made.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use brightdata_client::{
    BrightDataClient, BrightDataError, DatasetKind, JobPoller, PollPolicy, TriggerInput,
};

fn test_client(server: &MockServer) -> BrightDataClient {
    BrightDataClient::new("test-token".to_string()).with_base_url(&server.uri())
}

fn quick_policy() -> PollPolicy {
    PollPolicy {
        poll_interval: Duration::from_millis(5),
        max_wait: Duration::from_secs(5),
        error_backoff: Duration::from_millis(5),
        ..PollPolicy::default()
    }
}

#[tokio::test]
async fn trigger_posts_inputs_and_returns_snapshot_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/trigger"))
        .and(query_param("dataset_id", "gd_l1villgoiiidt09ci"))
        .and(query_param("include_errors", "true"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_json(json!([{"url": "https://www.tiktok.com/@u1", "country": ""}])))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"snapshot_id": "s_abc"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let id = client
        .trigger_collection(
            DatasetKind::Profile,
            &[TriggerInput::new("https://www.tiktok.com/@u1")],
        )
        .await
        .expect("trigger should succeed");

    assert_eq!(id, "s_abc");
}

#[tokio::test]
async fn trigger_uses_configured_detail_dataset() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/trigger"))
        .and(query_param("dataset_id", "gd_custom"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"snapshot_id": "s_detail"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server).with_dataset(DatasetKind::VideoDetail, "gd_custom");
    let id = client
        .trigger_collection(DatasetKind::VideoDetail, &[TriggerInput::new("https://www.tiktok.com/@u1/video/1")])
        .await
        .unwrap();

    assert_eq!(id, "s_detail");
}

#[tokio::test]
async fn trigger_without_snapshot_id_is_submission_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/trigger"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "queued"})))
        .mount(&server)
        .await;

    let err = test_client(&server)
        .trigger_collection(DatasetKind::Profile, &[TriggerInput::new("https://www.tiktok.com/@u1")])
        .await
        .expect_err("missing id must fail");

    assert!(matches!(err, BrightDataError::Submission(_)), "got {err:?}");
}

#[tokio::test]
async fn trigger_bad_request_is_flagged() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/trigger"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid url"))
        .mount(&server)
        .await;

    let err = test_client(&server)
        .trigger_collection(DatasetKind::Profile, &[TriggerInput::new("not-a-url")])
        .await
        .expect_err("400 must fail");

    assert!(err.is_bad_request());
    assert!(err.to_string().contains("invalid url"));
}

#[tokio::test]
async fn fetch_snapshot_returns_raw_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/snapshot/s_abc"))
        .and(query_param("format", "json"))
        .respond_with(
            ResponseTemplate::new(202)
                .set_body_json(json!({"status": "running", "message": "Snapshot is not ready yet"})),
        )
        .mount(&server)
        .await;

    let body = test_client(&server).fetch_snapshot("s_abc").await.unwrap();
    assert_eq!(body["status"], "running");
}

#[tokio::test]
async fn poller_runs_job_until_ready_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/trigger"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"snapshot_id": "s_run"})))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/snapshot/s_run"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"status": "running"})))
        .up_to_n_times(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/snapshot/s_run"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"account_id": "u1", "top_videos": []}])),
        )
        .mount(&server)
        .await;

    let poller = JobPoller::new(Arc::new(test_client(&server)), quick_policy());
    let done = poller
        .run(DatasetKind::Profile, &["https://www.tiktok.com/@u1".to_string()])
        .await
        .expect("job should finish");

    assert_eq!(done.job_id, "s_run");
    assert_eq!(done.attempts, 3);
    assert_eq!(done.payload[0]["account_id"], "u1");
}

#[tokio::test]
async fn poller_surfaces_provider_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/trigger"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"snapshot_id": "s_bad"})))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/snapshot/s_bad"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "failed"})))
        .mount(&server)
        .await;

    let poller = JobPoller::new(Arc::new(test_client(&server)), quick_policy());
    let err = poller
        .run(DatasetKind::Profile, &["https://www.tiktok.com/@u1".to_string()])
        .await
        .expect_err("failed status must surface");

    assert!(matches!(err, BrightDataError::JobFailed { ref job_id, .. } if job_id == "s_bad"));
}
