#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use httprom::config::{ConfigV1, LoggingConfig, MetricsConfig};
use httprom::routes::create_router;
use httprom::state::AppState;
use prometheus::proto::{Metric, MetricFamily};
use prometheus::Registry;

pub fn test_config(service_name: &str) -> ConfigV1 {
    ConfigV1 {
        bind_address: "127.0.0.1:0".to_string(),
        metrics: MetricsConfig {
            service_name: service_name.to_string(),
            buckets: Vec::new(),
            pattern_buckets: Vec::new(),
        },
        logging: LoggingConfig::default(),
    }
}

/// Builds the full application router and returns it with its registry.
pub fn build_app(config: ConfigV1) -> (Router, Registry) {
    let state = AppState::new(Arc::new(config));
    let registry = state.registry.clone();
    let router = create_router(state).expect("recorders should register");
    (router, registry)
}

pub fn request(method: Method, path: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .body(Body::empty())
        .expect("failed to build request")
}

pub async fn body_string(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    String::from_utf8(bytes.to_vec()).expect("body is not UTF-8")
}

fn find_family(registry: &Registry, name: &str) -> Option<MetricFamily> {
    registry.gather().into_iter().find(|f| f.get_name() == name)
}

fn label(metric: &Metric, name: &str) -> Option<String> {
    metric
        .get_label()
        .iter()
        .find(|l| l.get_name() == name)
        .map(|l| l.get_value().to_string())
}

fn matches(metric: &Metric, code: &str, method: &str, path: &str) -> bool {
    label(metric, "code").as_deref() == Some(code)
        && label(metric, "method").as_deref() == Some(method)
        && label(metric, "path").as_deref() == Some(path)
}

/// Counter value for one `(code, method, path)` series, `None` if the series
/// does not exist.
pub fn counter_value(
    registry: &Registry,
    name: &str,
    code: &str,
    method: &str,
    path: &str,
) -> Option<f64> {
    find_family(registry, name)?
        .get_metric()
        .iter()
        .find(|m| matches(m, code, method, path))
        .map(|m| m.get_counter().get_value())
}

/// Sum of a counter across every series.
pub fn counter_total(registry: &Registry, name: &str) -> f64 {
    find_family(registry, name)
        .map(|f| f.get_metric().iter().map(|m| m.get_counter().get_value()).sum())
        .unwrap_or(0.0)
}

/// Number of observations in one histogram series.
pub fn histogram_count(
    registry: &Registry,
    name: &str,
    code: &str,
    method: &str,
    path: &str,
) -> Option<u64> {
    find_family(registry, name)?
        .get_metric()
        .iter()
        .find(|m| matches(m, code, method, path))
        .map(|m| m.get_histogram().get_sample_count())
}

/// Observations across every series of a histogram.
pub fn histogram_total(registry: &Registry, name: &str) -> u64 {
    find_family(registry, name)
        .map(|f| {
            f.get_metric()
                .iter()
                .map(|m| m.get_histogram().get_sample_count())
                .sum()
        })
        .unwrap_or(0)
}

/// All distinct `path` label values recorded by a metric.
pub fn recorded_paths(registry: &Registry, name: &str) -> Vec<String> {
    let mut paths: Vec<String> = find_family(registry, name)
        .map(|f| {
            f.get_metric()
                .iter()
                .filter_map(|m| label(m, "path"))
                .collect()
        })
        .unwrap_or_default();
    paths.sort();
    paths.dedup();
    paths
}

/// The `service` label of the first series of a metric.
pub fn service_label(registry: &Registry, name: &str) -> Option<String> {
    find_family(registry, name)?
        .get_metric()
        .first()
        .and_then(|m| label(m, "service"))
}
