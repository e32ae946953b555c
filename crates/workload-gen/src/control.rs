//! Control loop: drives the simulator with request bursts, periodic
//! background tasks, and status reports until a stop signal arrives.
//!
//! Cancellation is cooperative: it is observed between iterations, so no
//! in-flight unit of work is ever aborted mid-delay. The idle pause may be
//! cut short for responsiveness.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::sim::{Outcome, Simulator};

/// Loop scheduling parameters. Defaults reproduce the simulated traffic
/// shape: bursts of 2–5 requests with 0.5–2 s pauses, a background task
/// every 15th iteration, a status report every 10th.
#[derive(Debug, Clone)]
pub struct Pacing {
    pub burst_min: u32,
    pub burst_max: u32,
    pub pause_min_secs: f64,
    pub pause_max_secs: f64,
    pub idle_secs: f64,
    pub background_interval: u64,
    pub status_interval: u64,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            burst_min: 2,
            burst_max: 5,
            pause_min_secs: 0.5,
            pause_max_secs: 2.0,
            idle_secs: 1.0,
            background_interval: 15,
            status_interval: 10,
        }
    }
}

/// Counters reported at shutdown and asserted on by tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub iterations: u64,
    pub requests: u64,
    pub background_tasks: u64,
    pub status_reports: u64,
}

/// Sequential driver over the simulator; owns the shutdown path.
pub struct ControlLoop<R: Rng> {
    sim: Simulator,
    rng: R,
    pacing: Pacing,
    clock: Arc<dyn Clock>,
    shutdown: CancellationToken,
    stats: LoopStats,
}

impl<R: Rng> ControlLoop<R> {
    pub fn new(
        sim: Simulator,
        rng: R,
        pacing: Pacing,
        clock: Arc<dyn Clock>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            sim,
            rng,
            pacing,
            clock,
            shutdown,
            stats: LoopStats::default(),
        }
    }

    /// Run until the shutdown token is cancelled, then return final stats.
    pub async fn run(mut self) -> LoopStats {
        while !self.shutdown.is_cancelled() {
            self.stats.iterations += 1;
            let iteration = self.stats.iterations;
            self.run_iteration(iteration).await;

            let idle = Duration::from_secs_f64(self.pacing.idle_secs);
            tokio::select! {
                _ = self.clock.sleep(idle) => {}
                _ = self.shutdown.cancelled() => {}
            }
        }
        debug!(stats = ?self.stats, "control loop exiting");
        self.stats
    }

    /// One RUNNING iteration: a request burst, then the periodic
    /// background-task and status-report checks.
    async fn run_iteration(&mut self, iteration: u64) {
        let burst = self
            .rng
            .random_range(self.pacing.burst_min..=self.pacing.burst_max);
        for _ in 0..burst {
            match self.sim.simulate_request(&mut self.rng).await {
                Outcome::Success { duration_secs } => {
                    debug!(duration_secs, "request completed");
                }
                Outcome::Error { error_type } => {
                    debug!(%error_type, "request completed with injected error");
                }
            }
            self.stats.requests += 1;

            let pause = self
                .rng
                .random_range(self.pacing.pause_min_secs..=self.pacing.pause_max_secs);
            self.clock.sleep(Duration::from_secs_f64(pause)).await;
        }

        if iteration % self.pacing.background_interval == 0 {
            self.sim.simulate_background_task(&mut self.rng).await;
            self.stats.background_tasks += 1;
        }

        if iteration % self.pacing.status_interval == 0 {
            self.stats.status_reports += 1;
            info!(
                iteration,
                requests = self.stats.requests,
                background_tasks = self.stats.background_tasks,
                "generated requests and telemetry"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::NoopClock;
    use crate::sim::Rates;
    use crate::telemetry::capture::CaptureEmitter;
    use crate::vocab::Vocabulary;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn control_loop(pacing: Pacing) -> (ControlLoop<StdRng>, CaptureEmitter, CancellationToken) {
        let capture = CaptureEmitter::new();
        let clock = Arc::new(NoopClock);
        let sim = Simulator::new(
            Vocabulary::default(),
            Rates::default(),
            Arc::new(capture.clone()),
            clock.clone(),
        )
        .unwrap();
        let token = CancellationToken::new();
        let cl = ControlLoop::new(sim, StdRng::seed_from_u64(17), pacing, clock, token.clone());
        (cl, capture, token)
    }

    #[tokio::test]
    async fn cancelled_token_stops_before_first_iteration() {
        let (cl, capture, token) = control_loop(Pacing::default());
        token.cancel();
        let stats = cl.run().await;
        assert_eq!(stats, LoopStats::default());
        assert!(capture.spans().is_empty());
    }

    #[tokio::test]
    async fn schedule_over_thirty_iterations() {
        let (mut cl, _capture, _token) = control_loop(Pacing::default());
        for iteration in 1..=30 {
            cl.run_iteration(iteration).await;
        }
        // Background every 15th iteration, status every 10th.
        assert_eq!(cl.stats.background_tasks, 2);
        assert_eq!(cl.stats.status_reports, 3);
    }

    #[tokio::test]
    async fn burst_size_stays_in_configured_range() {
        let (mut cl, capture, _token) = control_loop(Pacing {
            background_interval: 1000,
            status_interval: 1000,
            ..Pacing::default()
        });
        for iteration in 1..=20 {
            let before = capture.spans().len() as u32;
            cl.run_iteration(iteration).await;
            let burst = capture.spans().len() as u32 - before;
            assert!((2..=5).contains(&burst), "burst {burst}");
        }
        assert_eq!(cl.stats.requests as usize, capture.spans().len());
    }

    #[tokio::test]
    async fn pinned_burst_runs_exactly_three_requests_before_checks() {
        let pacing = Pacing {
            burst_min: 3,
            burst_max: 3,
            background_interval: 15,
            status_interval: 10,
            ..Pacing::default()
        };
        let (mut cl, capture, _token) = control_loop(pacing);

        cl.run_iteration(15).await;

        let spans = capture.spans();
        // Three request spans first, then the single background span.
        assert_eq!(spans.len(), 4);
        assert!(spans[..3].iter().all(|s| s.name.starts_with("handle_")));
        assert!(spans[3].name.starts_with("background_"));
        assert_eq!(cl.stats.requests, 3);
        assert_eq!(cl.stats.background_tasks, 1);
    }

    #[tokio::test]
    async fn run_counts_iterations_until_cancelled() {
        let (cl, _capture, token) = control_loop(Pacing {
            background_interval: 1000,
            status_interval: 1000,
            ..Pacing::default()
        });
        let handle = tokio::spawn(cl.run());
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
        let stats = handle.await.unwrap();
        assert!(stats.iterations >= 1);
        assert!(stats.requests >= stats.iterations);
    }
}
