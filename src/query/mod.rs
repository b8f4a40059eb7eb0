//! Query Engine
//!
//! Read-only substring search over the table store.

mod engine;

pub use engine::QueryEngine;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default number of hits returned
pub const DEFAULT_LIMIT: usize = 10;

/// Largest accepted limit
pub const MAX_LIMIT: usize = 8192;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Limit {0} out of range (1..={MAX_LIMIT})")]
    InvalidLimit(usize),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A validated search request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub query: String,
    pub limit: usize,
    pub newest_first: bool,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>, limit: usize, newest_first: bool) -> Result<Self, QueryError> {
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(QueryError::InvalidLimit(limit));
        }
        Ok(Self {
            query: query.into(),
            limit,
            newest_first,
        })
    }
}

/// One matching row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub timestamp: i64,
    #[serde(rename = "primaryURI")]
    pub primary_uri: String,
    #[serde(rename = "secondaryURI")]
    pub secondary_uri: String,
    pub hilite: String,
    pub annotation: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_bounds() {
        assert!(SearchQuery::new("q", 1, true).is_ok());
        assert!(SearchQuery::new("q", MAX_LIMIT, true).is_ok());
        assert!(matches!(
            SearchQuery::new("q", 0, true),
            Err(QueryError::InvalidLimit(0))
        ));
        assert!(matches!(
            SearchQuery::new("q", MAX_LIMIT + 1, false),
            Err(QueryError::InvalidLimit(_))
        ));
    }

    #[test]
    fn test_hit_wire_names() {
        let hit = SearchHit {
            timestamp: 5,
            primary_uri: "p".to_string(),
            secondary_uri: String::new(),
            hilite: "h".to_string(),
            annotation: String::new(),
        };
        let json = serde_json::to_value(&hit).unwrap();
        assert_eq!(json["primaryURI"], "p");
        assert_eq!(json["timestamp"], 5);
    }
}
