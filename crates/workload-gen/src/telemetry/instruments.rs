//! The instrument set: the four metric channels the engine writes to.
//!
//! Created once at STARTING from the SDK meter and owned for the process
//! lifetime. Aggregation and export are the SDK's concern.

use opentelemetry::metrics::{Counter, Histogram, Meter, Unit, UpDownCounter};

/// The four named measurement channels.
pub struct Instruments {
    /// Total requests processed, labelled `{operation, user}`.
    pub requests_total: Counter<u64>,
    /// Request processing time in seconds, labelled `{operation}`.
    pub request_duration_seconds: Histogram<f64>,
    /// Currently active users, perturbed ±1, labelled `{operation}`.
    pub active_users: UpDownCounter<i64>,
    /// Total injected errors, labelled `{operation, error_type}`.
    pub errors_total: Counter<u64>,
}

impl Instruments {
    pub fn new(meter: &Meter) -> Self {
        Self {
            requests_total: meter
                .u64_counter("requests_total")
                .with_description("Total requests processed")
                .with_unit(Unit::new("1"))
                .init(),
            request_duration_seconds: meter
                .f64_histogram("request_duration_seconds")
                .with_description("Request processing time")
                .with_unit(Unit::new("s"))
                .init(),
            active_users: meter
                .i64_up_down_counter("active_users")
                .with_description("Currently active users")
                .with_unit(Unit::new("1"))
                .init(),
            errors_total: meter
                .u64_counter("errors_total")
                .with_description("Total errors")
                .with_unit(Unit::new("1"))
                .init(),
        }
    }
}
