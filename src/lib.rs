//! hlte: highlight ingestion daemon
//!
//! Accepts highlight records over HTTP and fans each one out to the storage
//! formats it asks for, featuring:
//! - Per-format sink tasks (one JSON file per record, append-only CSV, SQLite table)
//! - Formats enabled and disabled at runtime without losing in-flight records
//! - Ordered shutdown that drains every accepted record
//! - Substring search over the SQLite table

pub mod config;
pub mod daemon;
pub mod pipeline;
pub mod query;
pub mod sink;
pub mod types;
pub mod util;

pub use config::Config;
pub use types::*;
