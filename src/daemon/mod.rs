//! Daemon Module
//!
//! Wires the fan-out pipeline and the query engine to the HTTP API.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        hlte daemon                           │
//! │                                                              │
//! │  ┌────────────────┐   POST /        ┌──────────────────┐    │
//! │  │  HTTP API      │ ──────────────▶ │  Pipeline        │    │
//! │  │  (axum)        │   /formats/:n   │  (fan-out)       │    │
//! │  │                │ ──────────────▶ │  json/csv/sqlite │    │
//! │  │                │                 └────────┬─────────┘    │
//! │  │                │   GET /search            │ data.sqlite3 │
//! │  │                │ ──────────────▶ ┌────────┴─────────┐    │
//! │  └────────────────┘                 │  Query Engine    │    │
//! │                                     └──────────────────┘    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Shutdown order
//!
//! HTTP stops accepting first, then the pipeline drains every accepted
//! record into its sinks, then the query engine closes.

pub mod http;
pub mod lifecycle;

pub use http::HttpServer;
pub use lifecycle::Daemon;
