use std::sync::Arc;

use axum::Router;

use crate::Pages;

mod health;
mod queries;

// ---

pub fn router(pages: Arc<Pages>) -> Router {
    // ---
    Router::new()
        .merge(queries::router())
        .merge(health::router())
        .with_state(pages)
}
