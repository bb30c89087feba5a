//! HTTP route definitions and handlers.
//!
//! Application routes are wrapped by both request recorders; the health and
//! metrics endpoints are merged afterwards so scrapes and probes stay out of
//! the request metrics.

mod echo_routes;
mod health_routes;
mod metrics;
mod status_routes;

use crate::middleware::{try_new_middleware, try_new_pattern_middleware};
use crate::state::AppState;
use crate::utils::http_helpers::HTTPError;
use axum::{http::StatusCode, Router};

/// Creates the application router with all configured routes.
///
/// Registers the exact-path and route-pattern recorders into the state's
/// registry.
///
/// # Errors
///
/// Fails when the recorders cannot be registered, for instance because a
/// router was already built against the same registry.
pub fn create_router(state: AppState) -> Result<Router, prometheus::Error> {
    let metrics_config = &state.config.metrics;
    let exact = try_new_middleware(
        &state.registry,
        &metrics_config.service_name,
        &metrics_config.buckets,
    )?;
    let pattern = try_new_pattern_middleware(
        &state.registry,
        &metrics_config.service_name,
        &metrics_config.pattern_buckets,
    )?;

    let router = Router::new()
        .merge(echo_routes::routes())
        .nest("/api", status_routes::routes())
        // Set before layering so unmatched requests are recorded too; merging
        // would otherwise restore axum's unlayered default fallback.
        .fallback(not_found)
        .layer(pattern)
        .layer(exact)
        .merge(metrics::routes())
        .merge(health_routes::routes())
        .with_state(state);

    Ok(router)
}

async fn not_found() -> HTTPError {
    HTTPError::new(StatusCode::NOT_FOUND, "Not found")
}
