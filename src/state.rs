//! Shared application state.

use crate::config::ConfigV1;
use prometheus::Registry;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded at startup.
    pub config: Arc<ConfigV1>,
    /// Registry the request recorders register into and `/metrics` renders.
    pub registry: Registry,
}

impl AppState {
    /// State with a fresh, empty registry.
    pub fn new(config: Arc<ConfigV1>) -> Self {
        AppState {
            config,
            registry: Registry::new(),
        }
    }
}
