//! Request counter and latency histogram registration using Prometheus.

use prometheus::{CounterVec, Error, HistogramOpts, HistogramVec, Opts, Registry};
use tracing::debug;

/// Latency buckets in milliseconds used when the caller supplies none.
pub const DEFAULT_BUCKETS: [f64; 3] = [300.0, 1200.0, 5000.0];

/// Variable labels shared by every series a recorder produces.
pub const LABEL_NAMES: [&str; 3] = ["code", "method", "path"];

/// Name of the constant label carrying the owning service.
pub const SERVICE_LABEL: &str = "service";

/// Metric names and help texts for one recorder kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricKind {
    pub requests_name: &'static str,
    pub requests_help: &'static str,
    pub latency_name: &'static str,
    pub latency_help: &'static str,
}

/// Metrics keyed by the literal request path.
pub const PATH_METRICS: MetricKind = MetricKind {
    requests_name: "chi_requests_total",
    requests_help:
        "How many HTTP requests processed, partitioned by status code, method and HTTP path.",
    latency_name: "chi_request_duration_milliseconds",
    latency_help:
        "How long it took to process the request, partitioned by status code, method and HTTP path.",
};

/// Metrics keyed by the normalized route pattern.
pub const PATTERN_METRICS: MetricKind = MetricKind {
    requests_name: "chi_pattern_requests_total",
    requests_help: "How many HTTP requests processed, partitioned by status code, method and HTTP path (with patterns).",
    latency_name: "chi_pattern_request_duration_milliseconds",
    latency_help: "How long it took to process the request, partitioned by status code, method and HTTP path (with patterns).",
};

/// Trait for recording a finished HTTP request.
pub trait MetricsRecorder: Clone + Send + Sync + 'static {
    /// Increments the request counter and observes the latency, both under
    /// the same `(code, method, path)` label tuple.
    fn record_request(&self, code: &str, method: &str, path: &str, duration_ms: f64);
}

/// The counter/histogram pair owned by a single recorder.
///
/// Both vectors are internally synchronized by the `prometheus` crate, so a
/// clone can be handed to every in-flight request.
#[derive(Clone)]
pub struct RequestMetrics {
    requests_total: CounterVec,
    request_duration: HistogramVec,
}

impl RequestMetrics {
    /// Creates the counter and histogram for `kind` and registers both with
    /// `registry`.
    ///
    /// An empty `buckets` slice selects [`DEFAULT_BUCKETS`].
    ///
    /// # Errors
    ///
    /// Returns an error when the buckets are not strictly increasing positive
    /// finite values, or when a metric with the same name is already
    /// registered. Bucket validation happens before anything is registered.
    pub fn register(
        registry: &Registry,
        kind: &MetricKind,
        service_name: &str,
        buckets: &[f64],
    ) -> Result<Self, Error> {
        let buckets = resolve_buckets(buckets)?;

        let requests_total = CounterVec::new(
            Opts::new(kind.requests_name, kind.requests_help).const_label(SERVICE_LABEL, service_name),
            &LABEL_NAMES,
        )?;
        let request_duration = HistogramVec::new(
            HistogramOpts::new(kind.latency_name, kind.latency_help)
                .const_label(SERVICE_LABEL, service_name)
                .buckets(buckets.clone()),
            &LABEL_NAMES,
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        if let Err(e) = registry.register(Box::new(request_duration.clone())) {
            // Leave the registry as it was before this call.
            let _ = registry.unregister(Box::new(requests_total));
            return Err(e);
        }

        debug!(
            service = service_name,
            counter = kind.requests_name,
            histogram = kind.latency_name,
            ?buckets,
            "Registered request metrics"
        );

        Ok(RequestMetrics {
            requests_total,
            request_duration,
        })
    }
}

impl MetricsRecorder for RequestMetrics {
    fn record_request(&self, code: &str, method: &str, path: &str, duration_ms: f64) {
        let labels = [code, method, path];
        self.requests_total.with_label_values(&labels).inc();
        self.request_duration
            .with_label_values(&labels)
            .observe(duration_ms);
    }
}

fn resolve_buckets(buckets: &[f64]) -> Result<Vec<f64>, Error> {
    if buckets.is_empty() {
        return Ok(DEFAULT_BUCKETS.to_vec());
    }

    if let Some(bad) = buckets.iter().find(|b| !b.is_finite() || **b <= 0.0) {
        return Err(Error::Msg(format!(
            "histogram bucket {} must be a positive finite number of milliseconds",
            bad
        )));
    }
    if let Some(pair) = buckets.windows(2).find(|w| w[0] >= w[1]) {
        return Err(Error::Msg(format!(
            "histogram buckets must be strictly increasing, got {} followed by {}",
            pair[0], pair[1]
        )));
    }

    Ok(buckets.to_vec())
}
