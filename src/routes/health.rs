// src/routes/health.rs
//! Health check endpoint for the dashboard service.
//!
//! Sibling of the page routes under the `routes` gateway: this file owns the
//! handler and exports a subrouter that `mod.rs` merges. The check never
//! touches the upstream API, so it reports the dashboard process only.

use axum::{routing::get, Json, Router};
use serde::Serialize;

/// JSON response body for the `/health` endpoint.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Handle `GET /health`.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Create a subrouter containing the `/health` route.
///
/// Generic over the application state so it merges with the gateway router
/// whatever the state type is.
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(health))
}
