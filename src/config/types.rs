use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::logging::LoggingConfig;
use super::metrics::MetricsConfig;

/// Environment variables with this prefix override values from the YAML
/// file, e.g. `HTTPROM_BIND_ADDRESS` or `HTTPROM_METRICS__SERVICE_NAME`.
pub const ENV_PREFIX: &str = "HTTPROM_";

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct ConfigV1 {
    pub bind_address: String,
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Builds the figment used by [`load_config`]: `./config.yaml` overlaid with
/// `HTTPROM_*` environment variables.
pub fn figment() -> Figment {
    Figment::new()
        .merge(Yaml::file("./config.yaml"))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Extracts and unwraps the versioned configuration from `figment`.
pub fn extract_config(figment: &Figment) -> Result<ConfigV1, figment::Error> {
    match figment.extract::<Config>()? {
        Config::ConfigV1(c) => Ok(c),
    }
}

/// Load config from "config.yaml" in the current directory plus environment
/// overrides. Exits the process if the configuration is invalid.
pub fn load_config() -> ConfigV1 {
    match extract_config(&figment()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            std::process::exit(1);
        }
    }
}

/// Print the JSON schema for the configuration to stdout.
pub fn print_schema() -> Result<(), serde_json::Error> {
    let schema = schema_for!(Config);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
