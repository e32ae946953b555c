//! Telemetry: the emission boundary, instrument set, and OTLP pipeline setup.

#[cfg(test)]
pub mod capture;
pub mod emit;
pub mod init;
pub mod instruments;

pub use init::{init_telemetry, TelemetryGuard};
