//! HTTP handlers for the litigation API.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;
use tracing::info;

use super::AppState;
use crate::models::ScrapeRequest;

fn detail(status: StatusCode, message: impl ToString) -> Response {
    (status, Json(json!({ "detail": message.to_string() }))).into_response()
}

/// Liveness check.
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// Service description.
pub async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "Instante Scrape",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "GET /health",
            "litigation": "POST /api/litigation",
        },
    }))
}

/// Run a litigation search.
///
/// Invalid requests are answered with 400 before any session is opened.
/// Scrape failures still return 200 with `success: false`.
pub async fn litigation(
    State(state): State<AppState>,
    payload: Result<Json<ScrapeRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(body) => body,
        Err(rejection) => return detail(rejection.status(), rejection.body_text()),
    };

    info!(
        "Litigation request: {:?}",
        request.primary_text().unwrap_or_default()
    );

    match state.service.search(request).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => detail(StatusCode::BAD_REQUEST, e),
    }
}
