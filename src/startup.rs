//! Application startup and server initialization.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::ConfigV1;
use crate::routes;
use crate::state::AppState;

/// Initializes and runs the application server.
///
/// Registers the request recorders into a fresh registry, builds the router
/// and serves it on the configured address until the process is stopped.
///
/// # Errors
///
/// Returns an error if the recorders cannot be registered (which aborts
/// startup), if the server fails to bind to the configured address, or if
/// it encounters a runtime error while serving.
pub async fn run(config: Arc<ConfigV1>) -> Result<(), Box<dyn std::error::Error>> {
    let state = AppState::new(config.clone());
    let app = routes::create_router(state)?;

    info!(
        service = %config.metrics.service_name,
        "Starting server on {}", config.bind_address
    );

    let listener = TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
