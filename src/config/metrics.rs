use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Settings for the request recorders.
///
/// An empty bucket list means the recorder defaults of 300, 1200 and 5000
/// milliseconds.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct MetricsConfig {
    /// Value of the constant `service` label on every series.
    pub service_name: String,
    /// Latency buckets (ms) for the exact-path recorder.
    #[serde(default)]
    pub buckets: Vec<f64>,
    /// Latency buckets (ms) for the route-pattern recorder.
    #[serde(default)]
    pub pattern_buckets: Vec<f64>,
}
