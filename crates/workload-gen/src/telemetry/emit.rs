//! The narrow emission boundary the engine writes telemetry through.
//!
//! [`Emitter`] mirrors the collaborator SDK surface the simulator needs:
//! span lifecycle, the four instrument channels, and structured log records.
//! All writes are buffered by the SDK; export failures never surface here.
//!
//! Two implementations exist: [`OtelEmitter`] (production, OTLP-backed) and
//! the capturing emitter in [`super::capture`] (tests only).

use std::time::SystemTime;

use opentelemetry::logs::{AnyValue, LogRecord, Logger as _, Severity};
use opentelemetry::trace::{Span as _, Status, Tracer as _};
use opentelemetry::{Key, KeyValue, StringValue, Value};

use super::instruments::Instruments;

/// A structured attribute value attached to spans, metric labels, or logs.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Str(String),
    F64(f64),
    Bool(bool),
}

impl From<AttrValue> for Value {
    fn from(value: AttrValue) -> Self {
        match value {
            AttrValue::Str(s) => Value::String(StringValue::from(s)),
            AttrValue::F64(f) => Value::F64(f),
            AttrValue::Bool(b) => Value::Bool(b),
        }
    }
}

impl From<AttrValue> for AnyValue {
    fn from(value: AttrValue) -> Self {
        match value {
            AttrValue::Str(s) => AnyValue::String(StringValue::from(s)),
            AttrValue::F64(f) => AnyValue::Double(f),
            AttrValue::Bool(b) => AnyValue::Boolean(b),
        }
    }
}

/// Log severities the engine emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Error,
}

impl LogLevel {
    fn severity(self) -> Severity {
        match self {
            LogLevel::Info => Severity::Info,
            LogLevel::Error => Severity::Error,
        }
    }

    fn text(self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Error => "ERROR",
        }
    }
}

/// Handle to one open span. Ending is explicit; every opened span must be
/// ended exactly once, on every outcome branch.
pub trait SpanHandle: Send {
    /// Attach one attribute to the span.
    fn set_attribute(&mut self, key: &'static str, value: AttrValue);

    /// Mark the span status ERROR with the given message.
    fn set_error(&mut self, message: &str);

    /// Close the span. Further calls on the handle are no-ops.
    fn end(&mut self);
}

/// Telemetry-emission boundary consumed by the simulator and control loop.
pub trait Emitter: Send + Sync {
    /// Open a root span with the given name.
    fn start_span(&self, name: &str) -> Box<dyn SpanHandle>;

    /// Increment the request counter.
    fn incr_requests(&self, labels: &[(&'static str, String)]);

    /// Record one observation on the request-duration histogram.
    fn record_duration(&self, seconds: f64, labels: &[(&'static str, String)]);

    /// Perturb the active-user up/down counter.
    fn add_active_users(&self, delta: i64, labels: &[(&'static str, String)]);

    /// Increment the error counter.
    fn incr_errors(&self, labels: &[(&'static str, String)]);

    /// Emit one structured log record.
    fn emit_log(&self, level: LogLevel, message: &str, fields: &[(&'static str, AttrValue)]);
}

/// Production emitter backed by the OTel SDK pipelines.
pub struct OtelEmitter {
    tracer: opentelemetry_sdk::trace::Tracer,
    instruments: Instruments,
    logger: opentelemetry_sdk::logs::Logger,
}

impl OtelEmitter {
    pub fn new(
        tracer: opentelemetry_sdk::trace::Tracer,
        instruments: Instruments,
        logger: opentelemetry_sdk::logs::Logger,
    ) -> Self {
        Self {
            tracer,
            instruments,
            logger,
        }
    }
}

impl Emitter for OtelEmitter {
    fn start_span(&self, name: &str) -> Box<dyn SpanHandle> {
        Box::new(OtelSpan(self.tracer.start(name.to_owned())))
    }

    fn incr_requests(&self, labels: &[(&'static str, String)]) {
        self.instruments.requests_total.add(1, &key_values(labels));
    }

    fn record_duration(&self, seconds: f64, labels: &[(&'static str, String)]) {
        self.instruments
            .request_duration_seconds
            .record(seconds, &key_values(labels));
    }

    fn add_active_users(&self, delta: i64, labels: &[(&'static str, String)]) {
        self.instruments.active_users.add(delta, &key_values(labels));
    }

    fn incr_errors(&self, labels: &[(&'static str, String)]) {
        self.instruments.errors_total.add(1, &key_values(labels));
    }

    fn emit_log(&self, level: LogLevel, message: &str, fields: &[(&'static str, AttrValue)]) {
        let attributes: Vec<(Key, AnyValue)> = fields
            .iter()
            .map(|(k, v)| (Key::from(*k), AnyValue::from(v.clone())))
            .collect();

        let mut record = self.logger.create_log_record();
        record.set_timestamp(SystemTime::now());
        record.set_severity_number(level.severity());
        record.set_severity_text(level.text().into());
        record.set_body(AnyValue::String(StringValue::from(message.to_owned())));
        record.add_attributes(attributes);

        self.logger.emit(record);
    }
}

/// Span handle wrapping an SDK span.
struct OtelSpan(opentelemetry_sdk::trace::Span);

impl SpanHandle for OtelSpan {
    fn set_attribute(&mut self, key: &'static str, value: AttrValue) {
        self.0.set_attribute(KeyValue::new(key, Value::from(value)));
    }

    fn set_error(&mut self, message: &str) {
        self.0.set_status(Status::error(message.to_owned()));
    }

    fn end(&mut self) {
        self.0.end();
    }
}

fn key_values(labels: &[(&'static str, String)]) -> Vec<KeyValue> {
    labels
        .iter()
        .map(|(k, v)| KeyValue::new(*k, v.clone()))
        .collect()
}
