use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// A general purpose HTTP error type that can be converted into an `IntoResponse`.
#[derive(Debug)]
pub struct HTTPError {
    status: StatusCode,
    message: String,
}

impl HTTPError {
    /// Creates a new HTTP error with the given status code and message.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        HTTPError {
            status,
            message: message.into(),
        }
    }
}

/// Metric encoding failures surface as a 500 on the scrape endpoint.
impl From<prometheus::Error> for HTTPError {
    fn from(err: prometheus::Error) -> Self {
        tracing::error!(error = %err, "Failed to encode metrics");
        HTTPError::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics")
    }
}

/// Converts our `HTTPError` into a JSON error response.
impl IntoResponse for HTTPError {
    fn into_response(self) -> Response {
        let body = json!({ "error": self.message }).to_string();
        (
            self.status,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response()
    }
}
