//! `workload-gen` — synthetic telemetry workload generator.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise the telemetry pipelines (console tracing + OTLP
//!    trace/metric/log exporters).
//! 3. Build the vocabulary, simulator, and control loop.
//! 4. Install the interrupt handler (RUNNING → DRAINING trigger).
//! 5. Run the control loop until stopped.
//! 6. Drain: give the exporters a bounded window to flush, then exit.
//!
//! Exit code is nonzero only when startup fails; an interrupt-driven stop
//! is the expected termination path and exits zero.

mod clock;
mod config;
mod control;
mod sim;
mod telemetry;
mod vocab;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio_util::sync::CancellationToken;
use tracing::info;

use clock::WallClock;
use config::Config;
use control::{ControlLoop, Pacing};
use sim::{Rates, Simulator};
use vocab::Vocabulary;

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    let (emitter, guard) = telemetry::init_telemetry(&cfg)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        endpoint = %cfg.otel_exporter_otlp_endpoint,
        service = %cfg.otel_service_name,
        "workload-gen starting; generating traces, metrics, and logs"
    );

    // -----------------------------------------------------------------------
    // 3. Simulation engine
    // -----------------------------------------------------------------------
    let rng = match cfg.random_seed {
        Some(seed) => {
            info!(seed, "using fixed random seed");
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_os_rng(),
    };
    let rates = Rates {
        error: cfg.error_rate,
        user_churn: cfg.user_churn_rate,
    };
    let clock = Arc::new(WallClock);
    let sim = Simulator::new(Vocabulary::default(), rates, Arc::new(emitter), clock.clone())?;

    // -----------------------------------------------------------------------
    // 4. Stop signal
    // -----------------------------------------------------------------------
    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("stop signal received");
                shutdown.cancel();
            }
        });
    }

    // -----------------------------------------------------------------------
    // 5. Control loop
    // -----------------------------------------------------------------------
    let stats = ControlLoop::new(sim, rng, Pacing::default(), clock, shutdown)
        .run()
        .await;

    // -----------------------------------------------------------------------
    // 6. Drain
    // -----------------------------------------------------------------------
    info!("flushing telemetry data");
    guard.drain(Duration::from_secs(cfg.drain_timeout_secs)).await;
    info!(
        iterations = stats.iterations,
        requests = stats.requests,
        background_tasks = stats.background_tasks,
        status_reports = stats.status_reports,
        "workload-gen stopped"
    );

    Ok(())
}
