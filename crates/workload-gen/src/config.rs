//! Configuration loading and validation for the workload generator.
//!
//! All values are read from environment variables at startup. The process
//! exits with a clear error message if any variable cannot be parsed or
//! fails validation.

use anyhow::{Context, Result};
use serde::Deserialize;

/// Validated generator configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// OTLP gRPC endpoint the exporters ship telemetry to.
    #[serde(default = "default_otlp_endpoint")]
    pub otel_exporter_otlp_endpoint: String,

    /// Resource `service.name` reported on every signal.
    #[serde(default = "default_service_name")]
    pub otel_service_name: String,

    /// Resource `service.version`.
    #[serde(default = "default_service_version")]
    pub otel_service_version: String,

    /// Resource `service.instance.id`.
    #[serde(default = "default_service_instance_id")]
    pub otel_service_instance_id: String,

    /// Console tracing filter (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Probability in `[0, 1]` that a simulated request ends in error.
    #[serde(default = "default_error_rate")]
    pub error_rate: f64,

    /// Probability in `[0, 1]` that a request perturbs the active-user gauge.
    #[serde(default = "default_user_churn_rate")]
    pub user_churn_rate: f64,

    /// Fixed seed for deterministic runs. Unset means OS entropy.
    #[serde(default)]
    pub random_seed: Option<u64>,

    /// Periodic metric reader export interval.
    #[serde(default = "default_metric_export_interval")]
    pub metric_export_interval_secs: u64,

    /// Bounded window given to the exporters to flush during DRAINING.
    #[serde(default = "default_drain_timeout")]
    pub drain_timeout_secs: u64,
}

fn default_otlp_endpoint() -> String {
    "http://collector:4317".into()
}
fn default_service_name() -> String {
    "workload-gen".into()
}
fn default_service_version() -> String {
    env!("CARGO_PKG_VERSION").into()
}
fn default_service_instance_id() -> String {
    "instance-1".into()
}
fn default_log_level() -> String {
    "info".into()
}
fn default_error_rate() -> f64 {
    0.15
}
fn default_user_churn_rate() -> f64 {
    0.30
}
fn default_metric_export_interval() -> u64 {
    5
}
fn default_drain_timeout() -> u64 {
    3
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any variable cannot be parsed or fails validation.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        ensure_non_empty(
            &self.otel_exporter_otlp_endpoint,
            "OTEL_EXPORTER_OTLP_ENDPOINT",
        )?;
        ensure_non_empty(&self.otel_service_name, "OTEL_SERVICE_NAME")?;
        ensure_probability(self.error_rate, "ERROR_RATE")?;
        ensure_probability(self.user_churn_rate, "USER_CHURN_RATE")?;

        if self.metric_export_interval_secs == 0 {
            anyhow::bail!("METRIC_EXPORT_INTERVAL_SECS must be > 0");
        }
        if self.drain_timeout_secs == 0 {
            anyhow::bail!("DRAIN_TIMEOUT_SECS must be > 0");
        }
        Ok(())
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} is required and must not be empty");
    }
    Ok(())
}

fn ensure_probability(value: f64, name: &str) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        anyhow::bail!("{name} must be a probability in [0.0, 1.0], got {value}");
    }
    Ok(())
}
