//! HTTP API Authentication Middleware
//!
//! Passphrase check on the `x-hlte-pp` header.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::warn;

use super::types::ErrorResponse;

/// Header carrying the SHA-512 hex of the passphrase
pub const PASSPHRASE_HEADER: &str = "x-hlte-pp";

/// Shared state for authentication
#[derive(Clone, Default)]
pub struct AuthState {
    /// Expected header value (None means the header must be absent)
    pub expected: Option<Arc<str>>,
}

impl AuthState {
    pub fn new(expected: Option<&str>) -> Self {
        Self {
            expected: expected.filter(|s| !s.is_empty()).map(Arc::from),
        }
    }

    /// Check if a passphrase is configured
    pub fn auth_required(&self) -> bool {
        self.expected.is_some()
    }

    /// With a passphrase configured the header must appear exactly once and
    /// match it. Without one the header must not appear at all.
    pub fn authorize(&self, headers: &HeaderMap) -> bool {
        let mut values = headers.get_all(PASSPHRASE_HEADER).iter();
        match &self.expected {
            None => values.next().is_none(),
            Some(expected) => match (values.next(), values.next()) {
                (Some(value), None) => value.as_bytes() == expected.as_bytes(),
                _ => false,
            },
        }
    }
}

/// Authentication middleware
pub async fn auth_middleware(
    State(auth): State<AuthState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if auth.authorize(request.headers()) {
        return next.run(request).await;
    }

    warn!(
        method = %request.method(),
        uri = %request.uri(),
        "Unauthorized call"
    );
    (
        StatusCode::FORBIDDEN,
        Json(ErrorResponse::forbidden("Missing or invalid passphrase")),
    )
        .into_response()
}
