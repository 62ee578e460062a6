//! # gsp-api — Axum API Service for the GSP Stack
//!
//! HTTP backend for the gs-propostas proposal management product.
//!
//! ## API Surface
//!
//! | Prefix                | Module                       | Domain              |
//! |-----------------------|------------------------------|---------------------|
//! | `/v1/signatures/*`    | [`routes::signatures`]       | Signer records + Gov.br validation |
//! | `/v1/clients/*`       | [`routes::clients`]          | Client registry     |
//! | `/v1/companies/*`     | [`routes::companies`]        | Issuing companies   |
//! | `/v1/items/*`         | [`routes::items`]            | Catalog items       |
//! | `/v1/categories/*`    | [`routes::categories`]       | Catalog categories  |
//! | `/v1/payment-modes/*` | [`routes::payment_modes`]    | Payment modes       |
//! | `/v1/notes/*`         | [`routes::notes`]            | Reusable notes      |
//! | `/v1/proposals/*`     | [`routes::proposals`]        | Proposals + PDF     |
//! | `/health/*`, `/metrics` | [`routes::health`], here   | Probes + scrape     |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → Handler
//! ```
//!
//! The API carries no authentication, matching the original product's
//! server actions. OpenAPI spec served at `/openapi.json`.

pub mod cache;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::{Extension, Router};
use tower_http::trace::TraceLayer;

use crate::middleware::metrics::ApiMetrics;
use crate::state::AppState;

/// Check if metrics are enabled via the `GSP_METRICS_ENABLED` env var.
/// Defaults to `true` when the variable is absent or set to anything
/// other than `"false"`.
fn metrics_enabled() -> bool {
    std::env::var("GSP_METRICS_ENABLED")
        .map(|v| v.to_lowercase() != "false")
        .unwrap_or(true)
}

/// Assemble the full application router with all routes and middleware.
///
/// Health probes (`/health/*`) and `/metrics` are mounted beside the
/// `/v1` surface without the metrics middleware, so probe traffic never
/// skews the request counters.
pub fn app(state: AppState) -> Router {
    let metrics = ApiMetrics::new();
    let metrics_on = metrics_enabled();

    // Body size limit: 2 MiB. The largest legitimate payload is a
    // signature create/update carrying a base64 image data URL capped at
    // 500 KB decoded (~683 KB encoded).
    let mut api = Router::new()
        .merge(routes::signatures::router())
        .merge(routes::clients::router())
        .merge(routes::companies::router())
        .merge(routes::items::router())
        .merge(routes::categories::router())
        .merge(routes::payment_modes::router())
        .merge(routes::notes::router())
        .merge(routes::proposals::router())
        .merge(openapi::router())
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024));

    if metrics_on {
        api = api
            .layer(from_fn(middleware::metrics::metrics_middleware))
            .layer(Extension(metrics.clone()));
    }

    let api = api.layer(TraceLayer::new_for_http()).with_state(state.clone());

    let mut probes = Router::new().merge(routes::health::router());
    if metrics_on {
        probes = probes
            .route("/metrics", axum::routing::get(prometheus_metrics))
            .layer(Extension(metrics));
    }
    let probes = probes.with_state(state);

    Router::new().merge(probes).merge(api)
}

/// GET /metrics — Prometheus scrape endpoint.
///
/// Updates the query cache gauge from current `AppState` on each scrape
/// (pull model), then encodes the registry in text exposition format.
async fn prometheus_metrics(
    State(state): State<AppState>,
    Extension(metrics): Extension<ApiMetrics>,
) -> impl IntoResponse {
    metrics.query_cache_entries().set(state.cache.len() as f64);

    match metrics.gather_and_encode() {
        Ok(body) => (StatusCode::OK, body).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, String::new()).into_response()
        }
    }
}
