//! Route table for the gateway.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Build the full router: auth operations, admin operations, and the
/// catch-all proxy. Everything that matches no explicit route is
/// forwarded to a backend.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/auth/login", post(handlers::login))
        .route("/auth/logout", post(handlers::logout))
        .route("/auth/me", get(handlers::me))
        .route("/auth/refresh", post(handlers::refresh))
        .route("/admin/backends", get(handlers::list_backends))
        .route("/admin/health/sweep", post(handlers::force_sweep))
        .route("/admin/metrics", get(handlers::metrics_summary))
        .route("/admin/metrics/recent", get(handlers::metrics_recent))
        .fallback(handlers::proxy)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
