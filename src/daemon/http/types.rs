//! HTTP API Request/Response Types
//!
//! JSON-serializable types for the HTTP API.

use serde::{Deserialize, Serialize};

use crate::pipeline::RegistrationOutcome;
use crate::sink::SinkStats;

/// Query string of `POST /`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngestParams {
    /// Comma-separated format names
    pub formats: Option<String>,
    /// Client-computed SHA-256 hex of the body
    pub checksum: Option<String>,
}

/// Accepted ingest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    pub checksum: String,
    /// Nanoseconds since the Unix epoch; also the record's identity in every sink
    pub timestamp: i64,
}

/// Query string of `GET /search`.
///
/// Kept as raw strings so that parse failures map to our own 400 body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    /// Substring to look for
    pub q: Option<String>,
    /// Result limit
    pub l: Option<String>,
    /// Newest first
    pub d: Option<String>,
}

/// Result of `PUT`/`DELETE /formats/:name`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatChangeResponse {
    pub format: String,
    pub outcome: String,
    /// Present when a sink was retired
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<SinkStats>,
}

impl FormatChangeResponse {
    pub fn new(format: impl Into<String>, outcome: &RegistrationOutcome) -> Self {
        let (label, stats) = match outcome {
            RegistrationOutcome::Enabled => ("enabled", None),
            RegistrationOutcome::AlreadyEnabled => ("already_enabled", None),
            RegistrationOutcome::Disabled(stats) => ("disabled", Some(*stats)),
            RegistrationOutcome::NotRegistered => ("not_registered", None),
            RegistrationOutcome::UnknownFormat => ("unknown_format", None),
            RegistrationOutcome::Failed(_) => ("failed", None),
        };
        Self {
            format: format.into(),
            outcome: label.to_string(),
            stats,
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Whether the service is healthy
    pub healthy: bool,
    /// Service version
    pub version: String,
    /// Formats currently accepting records
    pub formats: Vec<String>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn unavailable() -> Self {
        Self::new("UNAVAILABLE", "Daemon is shutting down")
    }
}
