//! # Health Probes
//!
//! Liveness answers as long as the process serves requests; readiness
//! additionally round-trips the database.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;

/// Build the health router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
}

/// GET /health/liveness — Process is up.
#[utoipa::path(
    get,
    path = "/health/liveness",
    responses((status = 200, description = "Service is alive")),
    tag = "health"
)]
async fn liveness() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /health/readiness — Process can reach Postgres.
#[utoipa::path(
    get,
    path = "/health/readiness",
    responses(
        (status = 200, description = "Service is ready"),
        (status = 503, description = "Database unreachable"),
    ),
    tag = "health"
)]
async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "ready" })),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "readiness probe failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "unavailable",
                    "reason": "database unreachable",
                })),
            )
        }
    }
}
