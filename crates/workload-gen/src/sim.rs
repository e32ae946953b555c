//! Unit-of-work simulator.
//!
//! Models one request or one background task: samples parameters from the
//! vocabulary, holds a span open across a real delay, and writes the
//! correlated {span, metric, log} triple through the emitter. The same
//! operation/user/duration/outcome values appear in all three signals;
//! that cross-signal consistency is the engine's defining contract.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use crate::clock::Clock;
use crate::telemetry::emit::{AttrValue, Emitter, LogLevel};
use crate::vocab::{VocabError, Vocabulary};

/// Simulated request processing time bounds, seconds.
const REQUEST_DURATION_SECS: (f64, f64) = (0.1, 1.5);
/// Background tasks model heavier work and take longer.
const BACKGROUND_DURATION_SECS: (f64, f64) = (2.0, 5.0);

/// Injection probabilities. The 0.15 / 0.30 defaults mirror the observed
/// production traffic shape the generator imitates; both are overridable
/// through configuration.
#[derive(Debug, Clone, Copy)]
pub struct Rates {
    /// Probability that a request ends in a simulated error.
    pub error: f64,
    /// Probability that a request perturbs the active-user gauge.
    pub user_churn: f64,
}

impl Default for Rates {
    fn default() -> Self {
        Self {
            error: 0.15,
            user_churn: 0.30,
        }
    }
}

/// Result of one simulated request.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success { duration_secs: f64 },
    Error { error_type: String },
}

/// Drives one unit of work at a time; never two in flight concurrently.
pub struct Simulator {
    vocab: Vocabulary,
    rates: Rates,
    emitter: Arc<dyn Emitter>,
    clock: Arc<dyn Clock>,
}

impl Simulator {
    /// Build a simulator over validated vocabulary sets.
    ///
    /// # Errors
    ///
    /// Returns [`VocabError`] if any vocabulary set is empty.
    pub fn new(
        vocab: Vocabulary,
        rates: Rates,
        emitter: Arc<dyn Emitter>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, VocabError> {
        vocab.validate()?;
        Ok(Self {
            vocab,
            rates,
            emitter,
            clock,
        })
    }

    /// Simulate one user request.
    ///
    /// Opens a `handle_<operation>` root span, blocks for the sampled
    /// duration, writes the request counter and duration histogram,
    /// occasionally perturbs the active-user gauge, and emits exactly one
    /// log record. With probability [`Rates::error`] the outcome is an
    /// injected error: the span status becomes ERROR, the error counter is
    /// incremented, and the log record is error-level instead of info.
    ///
    /// The span is closed on every branch. A simulated error is modeled
    /// data, never a failure that propagates to the caller.
    pub async fn simulate_request<R: Rng>(&self, rng: &mut R) -> Outcome {
        let user = pick(rng, &self.vocab.users).to_owned();
        let operation = pick(rng, &self.vocab.operations).to_owned();
        let request_id = format!("req_{}", rng.random_range(1000..=9999));

        let mut span = self.emitter.start_span(&format!("handle_{operation}"));
        span.set_attribute("user.id", AttrValue::Str(user.clone()));
        span.set_attribute("operation.name", AttrValue::Str(operation.clone()));
        span.set_attribute("request.id", AttrValue::Str(request_id));

        let duration =
            rng.random_range(REQUEST_DURATION_SECS.0..=REQUEST_DURATION_SECS.1);
        self.clock.sleep(Duration::from_secs_f64(duration)).await;

        self.emitter.incr_requests(&[
            ("operation", operation.clone()),
            ("user", user.clone()),
        ]);
        self.emitter
            .record_duration(duration, &[("operation", operation.clone())]);

        if rng.random_bool(self.rates.user_churn) {
            let delta = if rng.random_bool(0.5) { 1 } else { -1 };
            self.emitter
                .add_active_users(delta, &[("operation", operation.clone())]);
        }

        let outcome = if rng.random_bool(self.rates.error) {
            let error_type = pick(rng, &self.vocab.error_kinds).to_owned();

            span.set_error(&format!("{error_type} occurred"));
            span.set_attribute("error.type", AttrValue::Str(error_type.clone()));

            self.emitter.incr_errors(&[
                ("operation", operation.clone()),
                ("error_type", error_type.clone()),
            ]);
            self.emitter.emit_log(
                LogLevel::Error,
                &format!("Request failed: {error_type} for {user}"),
                &[
                    ("user_id", AttrValue::Str(user)),
                    ("operation", AttrValue::Str(operation)),
                    ("error_type", AttrValue::Str(error_type.clone())),
                    ("duration", AttrValue::F64(duration)),
                ],
            );

            Outcome::Error { error_type }
        } else {
            self.emitter.emit_log(
                LogLevel::Info,
                &format!("Processed {operation} request for {user} in {duration:.2}s"),
                &[
                    ("user_id", AttrValue::Str(user)),
                    ("operation", AttrValue::Str(operation)),
                    ("duration", AttrValue::F64(duration)),
                    ("status", AttrValue::Str("success".into())),
                ],
            );

            Outcome::Success {
                duration_secs: duration,
            }
        };

        span.end();
        outcome
    }

    /// Simulate one scheduled background task.
    ///
    /// Same shape as a request but with no user dimension, no error
    /// injection, and no gauge perturbation. The request counter and
    /// duration histogram are written under `operation=background_<kind>`.
    pub async fn simulate_background_task<R: Rng>(&self, rng: &mut R) {
        let kind = pick(rng, &self.vocab.background_kinds).to_owned();
        let operation = format!("background_{kind}");

        let mut span = self.emitter.start_span(&operation);
        span.set_attribute("task.type", AttrValue::Str(kind.clone()));
        span.set_attribute("task.scheduled", AttrValue::Bool(true));

        let duration =
            rng.random_range(BACKGROUND_DURATION_SECS.0..=BACKGROUND_DURATION_SECS.1);
        self.clock.sleep(Duration::from_secs_f64(duration)).await;

        self.emitter
            .incr_requests(&[("operation", operation.clone())]);
        self.emitter
            .record_duration(duration, &[("operation", operation)]);

        self.emitter.emit_log(
            LogLevel::Info,
            &format!("Background task {kind} completed in {duration:.2}s"),
            &[
                ("task_type", AttrValue::Str(kind)),
                ("duration", AttrValue::F64(duration)),
                ("scheduled", AttrValue::Bool(true)),
            ],
        );

        span.end();
    }
}

/// Uniform choice from a vocabulary slice. Slices are validated non-empty
/// at construction.
fn pick<'a, R: Rng>(rng: &mut R, items: &'a [String]) -> &'a str {
    &items[rng.random_range(0..items.len())]
}
