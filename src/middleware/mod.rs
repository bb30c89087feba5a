//! Tower layers recording request count and latency per status, method and
//! path.
//!
//! Two recorder kinds are provided. [`new_middleware`] labels requests with
//! their literal path, which is precise but grows one series per distinct
//! URL. [`new_pattern_middleware`] labels them with the route pattern the
//! router matched, so `/users/bob` and `/users/alice` both land on
//! `/users/{id}`.
//!
//! ```ignore
//! use axum::{Router, routing::get};
//! use httprom::middleware::{new_middleware, new_pattern_middleware};
//! use prometheus::Registry;
//!
//! let registry = Registry::new();
//! let app = Router::new()
//!     .route("/users/:id", get(handler))
//!     .layer(new_pattern_middleware(&registry, "users-api", &[]))
//!     .layer(new_middleware(&registry, "users-api", &[50.0, 250.0, 1000.0]));
//! ```

mod layer;
mod route_context;

pub use layer::{
    new_middleware, new_pattern_middleware, status_text, try_new_middleware,
    try_new_pattern_middleware, MetricsLayer, MetricsService, PathSource,
};
pub use route_context::{normalize_pattern, record_route_pattern, RouteContext};
