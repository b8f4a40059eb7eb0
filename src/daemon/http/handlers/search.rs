//! Search handler

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::{debug, error};

use super::{AppState, MAX_QUERY_LENGTH};
use crate::daemon::http::types::*;
use crate::query::{QueryError, SearchQuery, DEFAULT_LIMIT};
use crate::util::preview;

/// `GET /search?q=..&l=..&d=..`
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    let query = match parse_params(params) {
        Ok(query) => query,
        Err(message) => {
            debug!("Bad search request: {}", message);
            return (StatusCode::BAD_REQUEST, Json(ErrorResponse::bad_request(message)))
                .into_response();
        }
    };

    debug!(
        "HTTP search request: q={}, limit={}, newest_first={}",
        preview(&query.query, 50),
        query.limit,
        query.newest_first
    );

    match state.query.search(&query).await {
        Ok(hits) => (StatusCode::OK, Json(hits)).into_response(),
        Err(e) => {
            error!("Search failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::internal_error(e.to_string())),
            )
                .into_response()
        }
    }
}

fn parse_params(params: SearchParams) -> Result<SearchQuery, String> {
    let q = params.q.ok_or_else(|| "Missing 'q' parameter".to_string())?;
    if q.len() > MAX_QUERY_LENGTH {
        return Err(format!(
            "Query length {} exceeds maximum allowed length of {} bytes",
            q.len(),
            MAX_QUERY_LENGTH
        ));
    }

    let limit = match params.l.as_deref() {
        None => DEFAULT_LIMIT,
        Some(raw) => raw
            .trim()
            .parse::<usize>()
            .map_err(|e| format!("Invalid limit '{}': {}", raw, e))?,
    };

    let newest_first = match params.d.as_deref() {
        None => true,
        Some(raw) => parse_bool(raw).ok_or_else(|| format!("Invalid 'd' value '{}'", raw))?,
    };

    SearchQuery::new(q, limit, newest_first).map_err(|e| match e {
        QueryError::InvalidLimit(_) => e.to_string(),
        QueryError::Database(_) => "Unexpected database error".to_string(),
    })
}

/// Accepts the usual spellings: 1/0, t/f, true/false in lower, upper or title case
fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}
