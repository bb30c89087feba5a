//! The recorder layer shared by the exact-path and pattern variants.

use std::task::{Context, Poll};
use std::time::Instant;

use axum::extract::MatchedPath;
use futures::future::BoxFuture;
use http::{Request, Response, StatusCode};
use prometheus::Registry;
use tower::{Layer, Service};
use tracing::trace;

use super::route_context::{normalize_pattern, RouteContext};
use crate::metrics::{MetricKind, MetricsRecorder, RequestMetrics, PATH_METRICS, PATTERN_METRICS};

/// Where the `path` label of a recorded request comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSource {
    /// The literal request path.
    Exact,
    /// The normalized route pattern the router matched.
    Pattern,
}

impl PathSource {
    /// Metric names used by recorders of this kind.
    pub fn metric_kind(self) -> &'static MetricKind {
        match self {
            PathSource::Exact => &PATH_METRICS,
            PathSource::Pattern => &PATTERN_METRICS,
        }
    }
}

/// Registers the exact-path request metrics and returns a layer recording
/// into them.
///
/// # Errors
///
/// Fails on invalid buckets or when `chi_requests_total` /
/// `chi_request_duration_milliseconds` are already registered for this
/// service.
pub fn try_new_middleware(
    registry: &Registry,
    service_name: &str,
    buckets: &[f64],
) -> Result<MetricsLayer, prometheus::Error> {
    MetricsLayer::register(registry, service_name, buckets, PathSource::Exact)
}

/// Like [`try_new_middleware`] but aborts on registration failure, which
/// always means the recorder was constructed twice.
pub fn new_middleware(registry: &Registry, service_name: &str, buckets: &[f64]) -> MetricsLayer {
    try_new_middleware(registry, service_name, buckets)
        .expect("Failed to register chi_requests_total / chi_request_duration_milliseconds")
}

/// Registers the route-pattern request metrics and returns a layer
/// recording into them.
///
/// # Errors
///
/// Fails on invalid buckets or when the `chi_pattern_*` metrics are already
/// registered for this service.
pub fn try_new_pattern_middleware(
    registry: &Registry,
    service_name: &str,
    buckets: &[f64],
) -> Result<MetricsLayer, prometheus::Error> {
    MetricsLayer::register(registry, service_name, buckets, PathSource::Pattern)
}

/// Like [`try_new_pattern_middleware`] but aborts on registration failure.
pub fn new_pattern_middleware(
    registry: &Registry,
    service_name: &str,
    buckets: &[f64],
) -> MetricsLayer {
    try_new_pattern_middleware(registry, service_name, buckets).expect(
        "Failed to register chi_pattern_requests_total / chi_pattern_request_duration_milliseconds",
    )
}

/// Canonical reason phrase for `status`, or an empty string for codes
/// without one.
pub fn status_text(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("")
}

/// Layer producing [`MetricsService`]s that share one recorder.
#[derive(Clone)]
pub struct MetricsLayer<M = RequestMetrics> {
    recorder: M,
    source: PathSource,
}

impl MetricsLayer<RequestMetrics> {
    fn register(
        registry: &Registry,
        service_name: &str,
        buckets: &[f64],
        source: PathSource,
    ) -> Result<Self, prometheus::Error> {
        let recorder =
            RequestMetrics::register(registry, source.metric_kind(), service_name, buckets)?;
        Ok(MetricsLayer { recorder, source })
    }
}

impl<M: MetricsRecorder> MetricsLayer<M> {
    /// Builds a layer around an already constructed recorder.
    pub fn with_recorder(recorder: M, source: PathSource) -> Self {
        MetricsLayer { recorder, source }
    }
}

impl<S, M: MetricsRecorder> Layer<S> for MetricsLayer<M> {
    type Service = MetricsService<S, M>;

    fn layer(&self, inner: S) -> Self::Service {
        MetricsService {
            inner,
            recorder: self.recorder.clone(),
            source: self.source,
        }
    }
}

/// Service timing each request and recording it once the inner service has
/// produced a response.
///
/// The response is returned untouched. Errors from the inner service are
/// passed through and not recorded.
#[derive(Clone)]
pub struct MetricsService<S, M = RequestMetrics> {
    inner: S,
    recorder: M,
    source: PathSource,
}

enum PathLabel {
    Exact(String),
    Pattern {
        context: RouteContext,
        matched: Option<String>,
    },
}

impl PathLabel {
    fn resolve(self) -> String {
        match self {
            PathLabel::Exact(path) => path,
            PathLabel::Pattern { context, matched } => {
                if !context.is_empty() {
                    context.route_pattern()
                } else {
                    matched
                        .map(|m| normalize_pattern(&m))
                        .unwrap_or_default()
                }
            }
        }
    }
}

impl<S, M, ReqBody, ResBody> Service<Request<ReqBody>> for MetricsService<S, M>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Future: Send + 'static,
    M: MetricsRecorder,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let start = Instant::now();
        let method = req.method().clone();
        let label = match self.source {
            PathSource::Exact => PathLabel::Exact(req.uri().path().to_owned()),
            PathSource::Pattern => PathLabel::Pattern {
                matched: req
                    .extensions()
                    .get::<MatchedPath>()
                    .map(|m| m.as_str().to_owned()),
                context: RouteContext::attach(req.extensions_mut()),
            },
        };

        let future = self.inner.call(req);
        let recorder = self.recorder.clone();

        Box::pin(async move {
            let response = future.await?;

            let elapsed_ms = start.elapsed().as_nanos() as f64 / 1_000_000.0;
            let code = status_text(response.status());
            let path = label.resolve();
            trace!(code, method = %method, path = %path, elapsed_ms, "Recording request");
            recorder.record_request(code, method.as_str(), &path, elapsed_ms);

            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::sync::{Arc, Mutex};
    use tower::{service_fn, ServiceExt};

    #[derive(Clone, Default)]
    struct CapturingRecorder {
        records: Arc<Mutex<Vec<(String, String, String, f64)>>>,
    }

    impl MetricsRecorder for CapturingRecorder {
        fn record_request(&self, code: &str, method: &str, path: &str, duration_ms: f64) {
            self.records.lock().unwrap().push((
                code.to_string(),
                method.to_string(),
                path.to_string(),
                duration_ms,
            ));
        }
    }

    fn request(method: &str, uri: &str) -> Request<()> {
        Request::builder().method(method).uri(uri).body(()).unwrap()
    }

    #[test]
    fn status_text_uses_reason_phrases() {
        assert_eq!(status_text(StatusCode::OK), "OK");
        assert_eq!(status_text(StatusCode::NOT_FOUND), "Not Found");
        assert_eq!(
            status_text(StatusCode::INTERNAL_SERVER_ERROR),
            "Internal Server Error"
        );
        assert_eq!(status_text(StatusCode::from_u16(599).unwrap()), "");
    }

    #[tokio::test]
    async fn records_exact_path_and_status() {
        let recorder = CapturingRecorder::default();
        let svc = MetricsLayer::with_recorder(recorder.clone(), PathSource::Exact).layer(
            service_fn(|_req: Request<()>| async {
                Ok::<_, Infallible>(
                    Response::builder()
                        .status(StatusCode::CREATED)
                        .body(())
                        .unwrap(),
                )
            }),
        );

        let response = svc.oneshot(request("POST", "/users/42?x=1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let records = recorder.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        let (code, method, path, elapsed) = &records[0];
        assert_eq!(code, "Created");
        assert_eq!(method, "POST");
        assert_eq!(path, "/users/42");
        assert!(*elapsed >= 0.0);
    }

    #[tokio::test]
    async fn unset_status_is_recorded_as_ok() {
        let recorder = CapturingRecorder::default();
        let svc = MetricsLayer::with_recorder(recorder.clone(), PathSource::Exact).layer(
            service_fn(|_req: Request<()>| async { Ok::<_, Infallible>(Response::new(())) }),
        );

        svc.oneshot(request("GET", "/")).await.unwrap();
        assert_eq!(recorder.records.lock().unwrap()[0].0, "OK");
    }

    #[tokio::test]
    async fn latency_keeps_sub_millisecond_precision() {
        let recorder = CapturingRecorder::default();
        let svc = MetricsLayer::with_recorder(recorder.clone(), PathSource::Exact).layer(
            service_fn(|_req: Request<()>| async {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                Ok::<_, Infallible>(Response::new(()))
            }),
        );

        svc.oneshot(request("GET", "/slow")).await.unwrap();
        let elapsed = recorder.records.lock().unwrap()[0].3;
        assert!(elapsed >= 5.0, "elapsed {elapsed} should include the sleep");
        assert_ne!(elapsed.fract(), 0.0);
    }

    #[tokio::test]
    async fn inner_errors_pass_through_unrecorded() {
        let recorder = CapturingRecorder::default();
        let svc = MetricsLayer::with_recorder(recorder.clone(), PathSource::Exact).layer(
            service_fn(|_req: Request<()>| async {
                Err::<Response<()>, _>("backend unavailable")
            }),
        );

        let err = svc.oneshot(request("GET", "/")).await.unwrap_err();
        assert_eq!(err, "backend unavailable");
        assert!(recorder.records.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn pattern_label_comes_from_route_context() {
        let recorder = CapturingRecorder::default();
        let svc = MetricsLayer::with_recorder(recorder.clone(), PathSource::Pattern).layer(
            service_fn(|req: Request<()>| async move {
                let context = req.extensions().get::<RouteContext>().unwrap();
                context.push_pattern("/api/*");
                context.push_pattern("/users/{id}");
                Ok::<_, Infallible>(Response::new(()))
            }),
        );

        svc.oneshot(request("GET", "/api/users/7")).await.unwrap();
        assert_eq!(recorder.records.lock().unwrap()[0].2, "/api/users/{id}");
    }

    #[tokio::test]
    async fn pattern_label_is_empty_without_routing_metadata() {
        let recorder = CapturingRecorder::default();
        let svc = MetricsLayer::with_recorder(recorder.clone(), PathSource::Pattern).layer(
            service_fn(|_req: Request<()>| async {
                Ok::<_, Infallible>(
                    Response::builder()
                        .status(StatusCode::NOT_FOUND)
                        .body(())
                        .unwrap(),
                )
            }),
        );

        svc.oneshot(request("GET", "/nowhere")).await.unwrap();
        let records = recorder.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, "Not Found");
        assert_eq!(records[0].2, "");
    }
}
