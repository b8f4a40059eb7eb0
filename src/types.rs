//! Core types flowing through the ingestion pipeline

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::warn;

// ============================================================================
// Content Identity
// ============================================================================

/// Content-addressed payload identifier (64-character lowercase SHA256 hex)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Checksum(pub String);

impl Checksum {
    /// Compute the SHA256 digest of raw payload bytes
    pub fn compute(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Checksum(hex::encode(hasher.finalize()))
    }

    /// Whether a client-supplied digest names the same content
    pub fn matches(&self, supplied: &str) -> bool {
        self.0.eq_ignore_ascii_case(supplied.trim())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Checksum> for String {
    fn from(checksum: Checksum) -> Self {
        checksum.0
    }
}

// ============================================================================
// Payload & Ingest
// ============================================================================

/// Highlight payload as sent by the browser extension.
///
/// Field names on the wire follow the extension (`data`, `uri`), not the
/// persisted column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    /// Highlighted text
    #[serde(rename = "data")]
    pub text: String,
    /// Page the highlight was taken from
    #[serde(rename = "uri")]
    pub primary_uri: String,
    /// Optional secondary location (e.g. a frame or linked resource)
    #[serde(
        rename = "secondaryURI",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub secondary_uri: Option<String>,
    /// Optional free-form note attached by the user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
}

/// Reasons an ingest request is rejected before it reaches the pipeline
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Empty payload")]
    EmptyPayload,

    #[error("No formats requested")]
    NoFormats,

    #[error("Checksum mismatch: supplied {supplied}, computed {computed}")]
    ChecksumMismatch { supplied: String, computed: String },

    #[error("Malformed payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),
}

/// A validated ingest request, not yet stamped with its pipeline timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ingest {
    pub checksum: Checksum,
    pub payload: Payload,
    pub formats: Vec<String>,
}

impl Ingest {
    /// Validate a raw request body.
    ///
    /// The checksum always covers the exact body bytes. A supplied checksum
    /// that does not match rejects the request; an absent one is filled in.
    pub fn from_body<I, S>(
        body: &[u8],
        supplied_checksum: Option<&str>,
        formats: I,
    ) -> Result<Self, IngestError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if body.is_empty() {
            return Err(IngestError::EmptyPayload);
        }

        let formats = normalize_formats(formats);
        if formats.is_empty() {
            return Err(IngestError::NoFormats);
        }

        let checksum = Checksum::compute(body);
        match supplied_checksum.map(str::trim).filter(|s| !s.is_empty()) {
            Some(supplied) if !checksum.matches(supplied) => {
                return Err(IngestError::ChecksumMismatch {
                    supplied: supplied.to_string(),
                    computed: checksum.0,
                });
            }
            Some(_) => {}
            None => {
                warn!(checksum = %checksum, "Payload received without checksum");
            }
        }

        let payload: Payload = serde_json::from_slice(body)?;

        Ok(Self {
            checksum,
            payload,
            formats,
        })
    }
}

/// Trim, drop empties and drop repeats while keeping first-seen order
pub fn normalize_formats<I, S>(formats: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for name in formats {
        let name = name.as_ref().trim();
        if name.is_empty() || out.iter().any(|f| f == name) {
            continue;
        }
        out.push(name.to_string());
    }
    out
}

// ============================================================================
// Record
// ============================================================================

static LAST_TIMESTAMP: AtomicI64 = AtomicI64::new(0);

/// Wall-clock nanoseconds, strictly increasing within the process.
///
/// Two records stamped in the same clock tick still get distinct values, so
/// per-record file names never collide.
pub fn next_timestamp() -> i64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or(0);

    let mut last = LAST_TIMESTAMP.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_TIMESTAMP.compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed)
        {
            Ok(_) => return next,
            Err(current) => last = current,
        }
    }
}

/// The unit of work routed through the pipeline. Immutable once stamped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub checksum: Checksum,
    pub payload: Payload,
    pub formats: Vec<String>,
    /// Nanoseconds since the Unix epoch, assigned on entry to the pipeline
    pub timestamp: i64,
}

impl Record {
    /// Stamp a validated ingest with the current pipeline timestamp
    pub fn stamp(ingest: Ingest) -> Self {
        Self::with_timestamp(ingest, next_timestamp())
    }

    pub fn with_timestamp(ingest: Ingest, timestamp: i64) -> Self {
        Self {
            checksum: ingest.checksum,
            payload: ingest.payload,
            formats: ingest.formats,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &[u8] = br#"{"data":"foo bar","uri":"https://example.com/a"}"#;

    #[test]
    fn test_checksum_compute() {
        let checksum = Checksum::compute(b"hello");
        assert_eq!(
            checksum.as_str(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert!(checksum.matches("2CF24DBA5FB0A30E26E83B2AC5B9E29E1B161E5C1FA7425E73043362938B9824"));
    }

    #[test]
    fn test_ingest_fills_missing_checksum() {
        let ingest = Ingest::from_body(BODY, None, ["json"]).unwrap();
        assert_eq!(ingest.checksum, Checksum::compute(BODY));
        assert_eq!(ingest.payload.text, "foo bar");
        assert_eq!(ingest.payload.primary_uri, "https://example.com/a");
        assert!(ingest.payload.secondary_uri.is_none());
    }

    #[test]
    fn test_ingest_blank_checksum_is_absent() {
        let ingest = Ingest::from_body(BODY, Some("  "), ["csv"]).unwrap();
        assert_eq!(ingest.checksum, Checksum::compute(BODY));
    }

    #[test]
    fn test_ingest_accepts_matching_checksum() {
        let digest = Checksum::compute(BODY);
        let ingest = Ingest::from_body(BODY, Some(digest.as_str()), ["sqlite"]).unwrap();
        assert_eq!(ingest.checksum, digest);
    }

    #[test]
    fn test_ingest_rejects_wrong_checksum() {
        let err = Ingest::from_body(BODY, Some("deadbeef"), ["json"]).unwrap_err();
        assert!(matches!(err, IngestError::ChecksumMismatch { .. }));
    }

    #[test]
    fn test_ingest_rejects_empty_and_malformed() {
        assert!(matches!(
            Ingest::from_body(b"", None, ["json"]),
            Err(IngestError::EmptyPayload)
        ));
        assert!(matches!(
            Ingest::from_body(b"not json", None, ["json"]),
            Err(IngestError::MalformedPayload(_))
        ));
        assert!(matches!(
            Ingest::from_body(BODY, None, Vec::<String>::new()),
            Err(IngestError::NoFormats)
        ));
    }

    #[test]
    fn test_normalize_formats() {
        let formats = normalize_formats(["csv", " json", "", "csv", "bogus"]);
        assert_eq!(formats, vec!["csv", "json", "bogus"]);
    }

    #[test]
    fn test_timestamps_strictly_increase() {
        let mut last = next_timestamp();
        for _ in 0..10_000 {
            let next = next_timestamp();
            assert!(next > last);
            last = next;
        }
    }

    #[test]
    fn test_payload_wire_names() {
        let payload = Payload {
            text: "t".to_string(),
            primary_uri: "u".to_string(),
            secondary_uri: Some("s".to_string()),
            annotation: None,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["data"], "t");
        assert_eq!(json["uri"], "u");
        assert_eq!(json["secondaryURI"], "s");
        assert!(json.get("annotation").is_none());
    }
}
