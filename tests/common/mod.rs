//! Shared test utilities for integration tests.
//!
//! This module provides a `TestClient` that makes requests against the full
//! router backed by an in-memory database. Methods are intentionally broad to
//! support various test scenarios across different test files.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::{middleware, Router};
use cashboard::config::Config;
use cashboard::csrf::{csrf_middleware, CsrfToken, CSRF_HEADER};
use cashboard::db::{create_in_memory_pool, migrations};
use cashboard::handlers;
use cashboard::state::AppState;
use http_body_util::BodyExt;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower::ServiceExt;

/// A test client that simulates the browser's AJAX session, allowing
/// sequential requests against the application.
pub struct TestClient {
    state: AppState,
}

impl TestClient {
    /// Create a new test client with a fresh in-memory database.
    pub fn new() -> Self {
        let pool = create_in_memory_pool().expect("Failed to create in-memory pool");
        {
            let conn = pool.get().expect("Failed to get connection");
            migrations::run_migrations(&conn, Path::new("migrations"))
                .expect("Failed to run migrations");
        }

        let config = Config {
            host: "127.0.0.1".into(),
            port: 7070,
            database_path: PathBuf::from(":memory:"),
            migrations_path: PathBuf::from("migrations"),
        };

        let state = AppState {
            db: pool,
            config: Arc::new(config),
            csrf_token: CsrfToken::generate(),
        };

        Self { state }
    }

    /// The per-process CSRF token, as handed out by `/api/csrf-token`.
    pub fn csrf_token(&self) -> String {
        self.state.csrf_token.value().to_string()
    }

    /// Router without the CSRF layer, for direct handler testing.
    pub fn router(&self) -> Router {
        handlers::routes().with_state(self.state.clone())
    }

    /// Full router with the CSRF middleware applied (mimics production setup).
    pub fn router_with_csrf(&self) -> Router {
        let token = self.state.csrf_token.clone();
        handlers::routes()
            .layer(middleware::from_fn(move |req, next| {
                let token = token.clone();
                csrf_middleware(token, req, next)
            }))
            .with_state(self.state.clone())
    }

    /// Make a GET request and return status and body.
    pub async fn get(&self, uri: &str) -> (StatusCode, String) {
        let response = self
            .router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8_lossy(&body).to_string())
    }

    /// GET and parse the response body as JSON.
    pub async fn get_json(&self, uri: &str) -> (StatusCode, Value) {
        let (status, body) = self.get(uri).await;
        let parsed = serde_json::from_str(&body).unwrap_or(Value::Null);
        (status, parsed)
    }

    async fn send_json(
        &self,
        router: Router,
        method: &str,
        uri: &str,
        body: Option<&Value>,
        with_token: bool,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if with_token {
            builder = builder.header(CSRF_HEADER, self.csrf_token());
        }
        let request = match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let parsed = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, parsed)
    }

    /// POST a JSON body and parse the response.
    pub async fn post_json(&self, uri: &str, body: &Value) -> (StatusCode, Value) {
        self.send_json(self.router(), "POST", uri, Some(body), false)
            .await
    }

    /// PUT a JSON body and parse the response.
    pub async fn put_json(&self, uri: &str, body: &Value) -> (StatusCode, Value) {
        self.send_json(self.router(), "PUT", uri, Some(body), false)
            .await
    }

    /// DELETE and parse the response.
    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send_json(self.router(), "DELETE", uri, None, false)
            .await
    }

    /// POST through the CSRF middleware, optionally omitting the token header.
    pub async fn post_json_with_csrf(
        &self,
        uri: &str,
        body: &Value,
        send_token: bool,
    ) -> (StatusCode, Value) {
        self.send_json(self.router_with_csrf(), "POST", uri, Some(body), send_token)
            .await
    }

    // =========================================================================
    // Helper methods for creating entities through the API
    // =========================================================================

    /// Create an account and return its id.
    pub async fn create_account(&self, name: &str, balance: f64) -> i64 {
        let (status, body) = self
            .post_json(
                "/account/api/accounts",
                &serde_json::json!({ "name": name, "balance": balance }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "account create failed: {}", body);
        body["data"]["id"].as_i64().expect("account id")
    }

    /// Create a category and return its id.
    pub async fn create_category(&self, name: &str, category_type: &str) -> i64 {
        let (status, body) = self
            .post_json(
                "/categories/api/categories",
                &serde_json::json!({ "name": name, "type": category_type }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "category create failed: {}", body);
        body["data"]["id"].as_i64().expect("category id")
    }

    /// Create a transaction and return its id.
    pub async fn create_transaction(
        &self,
        amount: f64,
        description: &str,
        account_id: i64,
        category_id: i64,
    ) -> i64 {
        let (status, body) = self
            .post_json(
                "/transactions/api/transactions",
                &serde_json::json!({
                    "amount": amount,
                    "description": description,
                    "account_id": account_id,
                    "category_id": category_id,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "transaction create failed: {}", body);
        body["data"]["id"].as_i64().expect("transaction id")
    }

    /// Create a transfer and return its id.
    pub async fn create_transfer(&self, from: i64, to: i64, amount: f64) -> i64 {
        let (status, body) = self
            .post_json(
                "/account/api/transfers",
                &serde_json::json!({
                    "from_account_id": from,
                    "to_account_id": to,
                    "amount": amount,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "transfer create failed: {}", body);
        body["data"]["id"].as_i64().expect("transfer id")
    }

    /// Current balance of an account, in dollars.
    pub async fn account_balance(&self, id: i64) -> f64 {
        let (status, body) = self.get_json(&format!("/account/api/accounts/{}", id)).await;
        assert_eq!(status, StatusCode::OK);
        body["data"]["balance"].as_f64().expect("balance")
    }
}

impl Default for TestClient {
    fn default() -> Self {
        Self::new()
    }
}
