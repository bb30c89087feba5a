//! Prometheus request metrics for axum and tower services.
//!
//! The [`middleware`] module provides the two request recorders; the rest of
//! the crate is the small service binary built around them.

pub mod config;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod startup;
pub mod state;
pub mod utils;
