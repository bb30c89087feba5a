//! Liveness probe.

use crate::state::AppState;
use axum::{routing::get, Router};

/// Registers health check routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Always answers 200 `OK` while the process is serving.
async fn health_check() -> &'static str {
    "OK"
}
