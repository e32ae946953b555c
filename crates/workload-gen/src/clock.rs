//! Injectable delay abstraction.
//!
//! The simulator's "work" is a real sleep on the driving task so that
//! exported timestamps and durations line up with wall-clock observation.
//! Tests swap in [`NoopClock`] to run the same control flow instantly.

use std::time::Duration;

use async_trait::async_trait;

/// Source of blocking delays for the simulation engine.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Suspend the calling task for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Production clock backed by the Tokio timer.
#[derive(Debug, Default)]
pub struct WallClock;

#[async_trait]
impl Clock for WallClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Test clock that never waits. It still yields to the scheduler so that
/// loops driven by it stay cooperative on a single-threaded runtime.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct NoopClock;

#[cfg(test)]
#[async_trait]
impl Clock for NoopClock {
    async fn sleep(&self, _duration: Duration) {
        tokio::task::yield_now().await;
    }
}
