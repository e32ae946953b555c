//! OTEL SDK initialisation: tracing subscriber + OTLP pipelines for all
//! three signals, and the DRAINING flush path.
//!
//! Providers are constructed explicitly and handed to the engine through
//! [`OtelEmitter`]; no ambient global registries are involved.

use std::time::Duration;

use anyhow::{Context, Result};
use opentelemetry::logs::LoggerProvider as _;
use opentelemetry::metrics::MeterProvider as _;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{logs, runtime, trace, Resource};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

use super::emit::OtelEmitter;
use super::instruments::Instruments;

/// Instrumentation scope name shared by all three signals.
const SCOPE: &str = "workload-gen";

/// Owns the three SDK providers so they can be flushed at DRAINING.
pub struct TelemetryGuard {
    tracer_provider: trace::TracerProvider,
    meter_provider: opentelemetry_sdk::metrics::SdkMeterProvider,
    logger_provider: logs::LoggerProvider,
}

/// Initialise the console tracing subscriber and the OTLP trace, metric,
/// and log pipelines.
///
/// # Errors
///
/// Returns an error if any exporter or pipeline cannot be initialised.
/// Startup failures here are fatal; nothing is retried.
pub fn init_telemetry(cfg: &Config) -> Result<(OtelEmitter, TelemetryGuard)> {
    init_subscriber(&cfg.log_level)?;

    let resource = service_resource(cfg);
    let endpoint = cfg.otel_exporter_otlp_endpoint.as_str();

    // --- Trace pipeline ---
    let span_exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(endpoint)
        .build_span_exporter()
        .context("failed to build OTLP span exporter")?;
    let tracer_provider = trace::TracerProvider::builder()
        .with_config(trace::Config::default().with_resource(resource.clone()))
        .with_batch_exporter(span_exporter, runtime::Tokio)
        .build();
    let tracer = tracer_provider.tracer(SCOPE);

    // --- Metrics pipeline ---
    let meter_provider = opentelemetry_otlp::new_pipeline()
        .metrics(runtime::Tokio)
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint),
        )
        .with_resource(resource.clone())
        .with_period(Duration::from_secs(cfg.metric_export_interval_secs))
        .build()
        .context("failed to install OTLP metrics pipeline")?;
    let instruments = Instruments::new(&meter_provider.meter(SCOPE));

    // --- Log pipeline ---
    let log_exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(endpoint)
        .build_log_exporter()
        .context("failed to build OTLP log exporter")?;
    let logger_provider = logs::LoggerProvider::builder()
        .with_config(logs::Config::default().with_resource(resource))
        .with_batch_exporter(log_exporter, runtime::Tokio)
        .build();
    let logger = logger_provider.logger(SCOPE);

    let emitter = OtelEmitter::new(tracer, instruments, logger);
    let guard = TelemetryGuard {
        tracer_provider,
        meter_provider,
        logger_provider,
    };
    Ok((emitter, guard))
}

impl TelemetryGuard {
    /// Give the batch exporters a bounded window to flush buffered signals.
    ///
    /// A missed deadline is logged as a warning; it is never an error.
    pub async fn drain(self, window: Duration) {
        let flush = tokio::task::spawn_blocking(move || {
            for result in self.tracer_provider.force_flush() {
                if let Err(e) = result {
                    warn!(error = %e, "span flush failed");
                }
            }
            for result in self.logger_provider.force_flush() {
                if let Err(e) = result {
                    warn!(error = %e, "log flush failed");
                }
            }
            // Shutdown forces a final collection + export of the metrics.
            if let Err(e) = self.meter_provider.shutdown() {
                warn!(error = %e, "metrics shutdown failed");
            }
        });

        if tokio::time::timeout(window, flush).await.is_err() {
            warn!("drain window elapsed before telemetry flush completed");
        }
    }
}

/// Initialise the tracing subscriber for console diagnostics.
///
/// Outputs structured JSON lines to stdout at the configured log level.
fn init_subscriber(log_level: &str) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialise tracing subscriber: {e}"))
}

fn service_resource(cfg: &Config) -> Resource {
    Resource::new(vec![
        KeyValue::new(
            opentelemetry_semantic_conventions::resource::SERVICE_NAME,
            cfg.otel_service_name.clone(),
        ),
        KeyValue::new(
            opentelemetry_semantic_conventions::resource::SERVICE_VERSION,
            cfg.otel_service_version.clone(),
        ),
        KeyValue::new(
            opentelemetry_semantic_conventions::resource::SERVICE_INSTANCE_ID,
            cfg.otel_service_instance_id.clone(),
        ),
    ])
}
