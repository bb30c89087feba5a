//! Echo endpoint, labelled by its route pattern rather than per message.

use crate::state::AppState;
use axum::{extract::Path, routing::get, Router};

pub fn routes() -> Router<AppState> {
    Router::new().route("/echo/:message", get(echo))
}

async fn echo(Path(message): Path<String>) -> String {
    message
}
