//! Page query endpoints.
//!
//! - `POST /api/pages/{page}/query` submits new parameters to a page.
//!   Answers `202` with the issued generations, or `200` with the settled
//!   page snapshot when called with `?wait=true`. Bad bodies and out-of-range
//!   parameters both answer `400` with `{ "error": .. }`.
//! - `GET /api/pages/{page}/state` returns the page snapshot as it is now.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::{IssuedQuery, PageKind, Pages, QueryParams};

// ---

pub fn router() -> Router<Arc<Pages>> {
    // ---
    Router::new()
        .route("/api/pages/{page}/query", post(submit))
        .route("/api/pages/{page}/state", get(state))
}

/// Request body for a page submission.
#[derive(Debug, Deserialize)]
pub struct QueryBody {
    latitude: f64,
    longitude: f64,
    days: u32,
}

#[derive(Debug, Default, Deserialize)]
pub struct SubmitOptions {
    #[serde(default)]
    wait: bool,
}

#[derive(Serialize)]
struct Accepted {
    page: PageKind,
    queries: Vec<IssuedQuery>,
}

async fn submit(
    Path(page): Path<String>,
    Query(options): Query<SubmitOptions>,
    State(pages): State<Arc<Pages>>,
    body: Result<Json<QueryBody>, JsonRejection>,
) -> Response {
    // ---
    let Some(page) = PageKind::parse(&page) else {
        return unknown_page(&page);
    };

    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            debug!("Rejected {:?} submission body: {}", page, rejection);
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    let params = match QueryParams::new(body.latitude, body.longitude, body.days) {
        Ok(params) => params,
        Err(e) => {
            debug!("Rejected {:?} submission {:?}: {}", page, body, e);
            return error_response(StatusCode::BAD_REQUEST, e.to_string());
        }
    };

    info!("POST /api/pages/{:?}/query {}", page, params);
    let queries = pages.submit(page, params);

    if options.wait {
        let snapshot = pages.settled(page, &queries).await;
        return (StatusCode::OK, Json(snapshot)).into_response();
    }

    (StatusCode::ACCEPTED, Json(Accepted { page, queries })).into_response()
}

async fn state(Path(page): Path<String>, State(pages): State<Arc<Pages>>) -> Response {
    // ---
    match PageKind::parse(&page) {
        Some(page) => (StatusCode::OK, Json(pages.snapshot(page))).into_response(),
        None => unknown_page(&page),
    }
}

fn unknown_page(name: &str) -> Response {
    error_response(StatusCode::NOT_FOUND, format!("unknown page '{}'", name))
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
