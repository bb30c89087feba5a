//! Per-request routing metadata read by the pattern recorder.

use std::sync::{Arc, Mutex, PoisonError};

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;
use http::Extensions;

/// Ordered route pattern segments matched while dispatching one request,
/// one segment per routing layer.
///
/// The pattern recorder attaches a context to the request extensions before
/// the inner service runs and reads it back once the response is ready. The
/// segments live behind a shared handle so that anything further down the
/// stack can append to the same list, even though it only ever sees its own
/// copy of the request.
#[derive(Debug, Clone, Default)]
pub struct RouteContext {
    patterns: Arc<Mutex<Vec<String>>>,
}

impl RouteContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the context already stored in `extensions`, inserting a fresh
    /// one first if there is none.
    pub fn attach(extensions: &mut Extensions) -> Self {
        if let Some(existing) = extensions.get::<RouteContext>() {
            return existing.clone();
        }
        let context = RouteContext::new();
        extensions.insert(context.clone());
        context
    }

    /// Appends the pattern matched by one routing layer.
    pub fn push_pattern(&self, pattern: impl Into<String>) {
        self.patterns
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(pattern.into());
    }

    pub fn patterns(&self) -> Vec<String> {
        self.patterns
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    /// All segments concatenated in match order, then normalized.
    ///
    /// Where one segment ends with `/` and the next starts with one, the
    /// join keeps a single slash. Yields an empty string when no routing
    /// layer recorded anything.
    pub fn route_pattern(&self) -> String {
        let mut joined = String::new();
        for segment in self.patterns() {
            let segment = if joined.ends_with('/') {
                segment.strip_prefix('/').unwrap_or(&segment)
            } else {
                segment.as_str()
            };
            joined.push_str(segment);
        }
        normalize_pattern(&joined)
    }
}

/// Collapses wildcard mount points out of a concatenated route pattern.
///
/// Every `/*/` becomes `/`, so a sub-router mounted at `/api/*` serving
/// `/users/{id}` reports `/api/users/{id}`. Adjacent wildcards are collapsed
/// too, so the result never contains `/*/`.
///
/// ```
/// use httprom::middleware::normalize_pattern;
///
/// assert_eq!(normalize_pattern("/api/*/users/{id}"), "/api/users/{id}");
/// assert_eq!(normalize_pattern("/users/{id}"), "/users/{id}");
/// ```
pub fn normalize_pattern(pattern: &str) -> String {
    let mut normalized = pattern.replace("/*/", "/");
    while normalized.contains("/*/") {
        normalized = normalized.replace("/*/", "/");
    }
    normalized
}

/// Middleware that records axum's [`MatchedPath`] into the request's
/// [`RouteContext`].
///
/// Install it with `Router::route_layer` when the pattern recorder wraps the
/// router from the outside, where the matched route is not yet known. axum
/// already reports nested routes with their full prefix, so one instance on
/// the innermost router that serves the route is enough.
pub async fn record_route_pattern(request: Request, next: Next) -> Response {
    let extensions = request.extensions();
    if let (Some(context), Some(matched)) = (
        extensions.get::<RouteContext>(),
        extensions.get::<MatchedPath>(),
    ) {
        context.push_pattern(matched.as_str());
    }
    next.run(request).await
}
