//! HTTP API Server
//!
//! Axum-based HTTP server for the ingest and search API.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::http::{header, HeaderName, Method};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::{AuthConfig, HttpConfig};

use super::auth::{AuthState, PASSPHRASE_HEADER};
use super::handlers::AppState;
use super::routes::create_router;

/// HTTP API server
pub struct HttpServer {
    config: HttpConfig,
    auth: AuthConfig,
    state: AppState,
}

impl HttpServer {
    pub fn new(config: HttpConfig, auth: AuthConfig, state: AppState) -> Self {
        Self {
            config,
            auth,
            state,
        }
    }

    /// Full router including CORS and request tracing
    pub fn router(&self) -> Router {
        let auth_state = AuthState::new(self.auth.expected());
        let mut app = create_router(self.state.clone(), auth_state);

        if self.config.cors_enabled {
            let cors = CorsLayer::new()
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    header::CONTENT_TYPE,
                    HeaderName::from_static(PASSPHRASE_HEADER),
                ])
                .allow_origin(Any);
            app = app.layer(cors);
        }

        app.layer(TraceLayer::new_for_http())
    }

    /// Serve until `shutdown` fires, then stop accepting and finish
    /// in-flight requests.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
        let addr: SocketAddr = self
            .config
            .listen_addr
            .parse()
            .context("Invalid HTTP listen address")?;

        let app = self.router();

        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind HTTP server to {}", addr))?;

        info!("HTTP API server listening on http://{}", addr);
        if self.auth.expected().is_some() {
            info!("Passphrase is set");
        }

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                info!("HTTP server shutting down");
            })
            .await
            .context("HTTP server error")?;

        Ok(())
    }
}
