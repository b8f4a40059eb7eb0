//! System handlers: health, version

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

use super::AppState;
use crate::daemon::http::types::*;

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        formats: state
            .pipeline
            .formats()
            .into_iter()
            .map(|f| f.name().to_string())
            .collect(),
    })
}

/// Crate version as plain text
pub async fn version() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        env!("CARGO_PKG_VERSION"),
    )
}
