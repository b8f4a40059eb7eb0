//! HTTP API Request Handlers
//!
//! Handlers that map HTTP requests onto the pipeline and the query engine.

mod formats;
mod ingest;
mod search;
mod system;

use std::sync::Arc;

use crate::pipeline::Pipeline;
use crate::query::QueryEngine;

/// Maximum allowed search query length (10KB)
const MAX_QUERY_LENGTH: usize = 10_000;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub query: QueryEngine,
}

// Re-export all handlers
pub use formats::{disable_format, enable_format, list_formats};
pub use ingest::ingest;
pub use search::search;
pub use system::{health, version};
