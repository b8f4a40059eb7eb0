//! HTTP API Server Module
//!
//! REST surface used by the browser extension: ingest, search and format
//! registration.

pub mod auth;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod types;

pub use handlers::AppState;
pub use routes::create_router;
pub use server::HttpServer;
