//! Integration tests for the CSRF layer and session plumbing routes.

mod common;

use axum::http::StatusCode;
use common::TestClient;
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_health() {
    let client = TestClient::new();

    let (status, body) = client.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn test_csrf_token_endpoint_hands_out_the_session_token() {
    let client = TestClient::new();

    let (status, body) = client.get_json("/api/csrf-token").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["csrf_token"], client.csrf_token());
}

#[tokio::test]
async fn test_mutation_without_token_rejected() {
    let client = TestClient::new();

    let (status, body) = client
        .post_json_with_csrf(
            "/account/api/accounts",
            &json!({ "name": "Checking" }),
            false,
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Invalid or missing CSRF token");
}

#[tokio::test]
async fn test_mutation_with_token_accepted() {
    let client = TestClient::new();

    let (status, body) = client
        .post_json_with_csrf(
            "/account/api/accounts",
            &json!({ "name": "Checking" }),
            true,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
}

#[tokio::test]
async fn test_reads_pass_without_token() {
    let client = TestClient::new();

    let response = client
        .router_with_csrf()
        .oneshot(axum::http::Request::builder()
            .uri("/account/api/accounts")
            .body(axum::body::Body::empty())
            .unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
