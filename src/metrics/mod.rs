//! Metrics collection and exposition for Prometheus.
//!
//! This module owns the counter/histogram pair behind each recorder and the
//! text rendering used by the `/metrics` endpoint.

mod recorder;

pub use recorder::{
    MetricKind, MetricsRecorder, RequestMetrics, DEFAULT_BUCKETS, LABEL_NAMES, PATH_METRICS,
    PATTERN_METRICS, SERVICE_LABEL,
};

use prometheus::{Encoder, Registry, TextEncoder};

/// Renders every metric in `registry` in Prometheus text format.
pub fn render(registry: &Registry) -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = registry.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| prometheus::Error::Msg(format!("metrics encoding produced invalid UTF-8: {e}")))
}
