//! CSRF protection middleware.
//!
//! Mutating requests (POST, PUT, DELETE, PATCH) must carry the per-process
//! token in the `X-CSRFToken` header. The token is handed to the client via
//! `GET /api/csrf-token` and echoed back on every AJAX mutation.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::sync::Arc;
use uuid::Uuid;

/// The header name checked on mutating requests.
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// CSRF token shared across the application.
#[derive(Clone)]
pub struct CsrfToken(Arc<String>);

impl CsrfToken {
    /// Generate a new random token.
    pub fn generate() -> Self {
        Self(Arc::new(Uuid::new_v4().to_string()))
    }

    pub fn value(&self) -> &str {
        &self.0
    }
}

/// Middleware that validates the CSRF header on state-changing requests.
pub async fn csrf_middleware(csrf_token: CsrfToken, request: Request<Body>, next: Next) -> Response {
    if !matches!(
        request.method(),
        &Method::POST | &Method::PUT | &Method::DELETE | &Method::PATCH
    ) {
        return next.run(request).await;
    }

    let header_token = request
        .headers()
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok());

    match header_token {
        Some(token) if token == csrf_token.value() => next.run(request).await,
        _ => (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({
                "status": "error",
                "message": "Invalid or missing CSRF token",
            })),
        )
            .into_response(),
    }
}
