//! Endpoints answering with a caller-chosen status code.
//!
//! Mounted under `/api`, which makes them handy for checking how the
//! recorders label nested routes and non-200 responses.

use crate::state::AppState;
use crate::utils::http_helpers::HTTPError;
use axum::{extract::Path, http::StatusCode, response::IntoResponse, routing::get, Router};

/// Registers the status routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/status/:code", get(respond_with_status))
}

/// Responds with `code` and its reason phrase as the body.
///
/// Codes outside 100..=999 are rejected with 400.
async fn respond_with_status(Path(code): Path<u16>) -> Result<impl IntoResponse, HTTPError> {
    let status = StatusCode::from_u16(code).map_err(|_| {
        HTTPError::new(
            StatusCode::BAD_REQUEST,
            format!("{} is not a valid HTTP status code", code),
        )
    })?;
    Ok((status, status.canonical_reason().unwrap_or_default()))
}
