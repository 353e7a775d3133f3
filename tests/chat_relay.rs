//! End-to-end tests for the chat relay.

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{json, Value};
use upload_relay::lifecycle::ShutdownReason;

mod common;

#[tokio::test]
async fn backend_down_is_service_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let service = common::start_service(common::test_config(dir.path(), common::unused_addr())).await;

    let res = common::client()
        .post(service.url("/api/send-message"))
        .json(&json!({ "message": "hello", "attachment": null }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = res.json().await.unwrap();
    assert!(body["error"].is_string());

    service.shutdown.trigger(ShutdownReason::Signal("SIGTERM"));
    service.handle.await.unwrap();
}

#[tokio::test]
async fn backend_reply_is_passed_through() {
    let dir = tempfile::tempdir().unwrap();
    let backend = common::start_chat_backend(
        200,
        r#"{"response":"hi there","session":"abc"}"#,
        Duration::ZERO,
    )
    .await;
    let service = common::start_service(common::test_config(dir.path(), backend)).await;

    let res = common::client()
        .post(service.url("/api/send-message"))
        .json(&json!({ "message": "hello", "attachment": ["a.png"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "response": "hi there", "session": "abc" }));

    service.shutdown.trigger(ShutdownReason::Signal("SIGTERM"));
    service.handle.await.unwrap();
}

#[tokio::test]
async fn backend_error_is_internal_error() {
    let dir = tempfile::tempdir().unwrap();
    let backend =
        common::start_chat_backend(500, r#"{"detail":"model crashed"}"#, Duration::ZERO).await;
    let service = common::start_service(common::test_config(dir.path(), backend)).await;

    let res = common::client()
        .post(service.url("/api/send-message"))
        .json(&json!({ "message": "hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

    service.shutdown.trigger(ShutdownReason::Signal("SIGTERM"));
    service.handle.await.unwrap();
}
