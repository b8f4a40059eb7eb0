//! Format registration handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::error;

use super::AppState;
use crate::daemon::http::types::*;
use crate::pipeline::RegistrationOutcome;

/// Formats currently registered
pub async fn list_formats(State(state): State<AppState>) -> impl IntoResponse {
    let names: Vec<&'static str> = state
        .pipeline
        .formats()
        .into_iter()
        .map(|f| f.name())
        .collect();
    Json(names)
}

/// `PUT /formats/:name`
pub async fn enable_format(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    match state.pipeline.enable(&name).await {
        Ok(outcome) => outcome_response(name, outcome),
        Err(e) => {
            error!("Enable '{}' failed: {}", name, e);
            (StatusCode::SERVICE_UNAVAILABLE, Json(ErrorResponse::unavailable())).into_response()
        }
    }
}

/// `DELETE /formats/:name`; returns once the sink has drained
pub async fn disable_format(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    match state.pipeline.disable(&name).await {
        Ok(outcome) => outcome_response(name, outcome),
        Err(e) => {
            error!("Disable '{}' failed: {}", name, e);
            (StatusCode::SERVICE_UNAVAILABLE, Json(ErrorResponse::unavailable())).into_response()
        }
    }
}

fn outcome_response(name: String, outcome: RegistrationOutcome) -> axum::response::Response {
    let status = match &outcome {
        RegistrationOutcome::Enabled => StatusCode::CREATED,
        RegistrationOutcome::AlreadyEnabled | RegistrationOutcome::Disabled(_) => StatusCode::OK,
        RegistrationOutcome::NotRegistered | RegistrationOutcome::UnknownFormat => {
            StatusCode::NOT_FOUND
        }
        RegistrationOutcome::Failed(message) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::internal_error(message.clone())),
            )
                .into_response();
        }
    };
    (status, Json(FormatChangeResponse::new(name, &outcome))).into_response()
}
