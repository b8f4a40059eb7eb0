//! Ingest handler

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::{debug, warn};

use super::AppState;
use crate::daemon::http::types::*;
use crate::types::{Ingest, IngestError};
use crate::util::preview;

/// `POST /?formats=a,b&checksum=..` with the raw payload as body
pub async fn ingest(
    State(state): State<AppState>,
    Query(params): Query<IngestParams>,
    body: Bytes,
) -> impl IntoResponse {
    let Some(formats) = params.formats else {
        warn!("POST without formats");
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::bad_request("Missing 'formats' parameter")),
        )
            .into_response();
    };

    let ingest = match Ingest::from_body(&body, params.checksum.as_deref(), formats.split(',')) {
        Ok(ingest) => ingest,
        Err(e) => {
            warn!(
                "Ingest rejected: {} (body: {})",
                e,
                preview(&String::from_utf8_lossy(&body), 200)
            );
            let (status, response) = match e {
                IngestError::ChecksumMismatch { .. } => {
                    (StatusCode::FORBIDDEN, ErrorResponse::forbidden(e.to_string()))
                }
                IngestError::EmptyPayload
                | IngestError::NoFormats
                | IngestError::MalformedPayload(_) => {
                    (StatusCode::BAD_REQUEST, ErrorResponse::bad_request(e.to_string()))
                }
            };
            return (status, Json(response)).into_response();
        }
    };

    match state.pipeline.ingest(ingest).await {
        Ok(record) => {
            debug!(
                checksum = %record.checksum,
                formats = ?record.formats,
                "Record accepted"
            );
            (
                StatusCode::OK,
                Json(IngestResponse {
                    checksum: record.checksum.to_string(),
                    timestamp: record.timestamp,
                }),
            )
                .into_response()
        }
        Err(e) => {
            warn!("Ingest refused: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse::unavailable()),
            )
                .into_response()
        }
    }
}
