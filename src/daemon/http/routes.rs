//! HTTP API Route Definitions

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use super::auth::{auth_middleware, AuthState};
use super::handlers::{self, AppState};

/// Create the API router with all routes
pub fn create_router(app_state: AppState, auth_state: AuthState) -> Router {
    let protected = Router::new()
        .route("/", post(handlers::ingest))
        .route("/version", get(handlers::version))
        .route("/search", get(handlers::search))
        .route("/formats", get(handlers::list_formats))
        .route(
            "/formats/:name",
            put(handlers::enable_format).delete(handlers::disable_format),
        )
        .route_layer(middleware::from_fn_with_state(auth_state, auth_middleware));

    Router::new()
        // Health check (no auth required)
        .route("/health", get(handlers::health))
        .merge(protected)
        .with_state(app_state)
}
