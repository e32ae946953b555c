//! Test-only emitter that records every write for assertion.

use std::sync::{Arc, Mutex};

use super::emit::{AttrValue, Emitter, LogLevel, SpanHandle};

/// Which instrument a metric write targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instrument {
    Requests,
    Duration,
    ActiveUsers,
    Errors,
}

/// One recorded metric write.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricWrite {
    pub instrument: Instrument,
    pub value: f64,
    pub labels: Vec<(String, String)>,
}

/// Recorded span status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapturedStatus {
    Unset,
    Error(String),
}

/// One recorded span lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedSpan {
    pub name: String,
    pub attributes: Vec<(String, AttrValue)>,
    pub status: CapturedStatus,
    pub end_count: usize,
}

/// One recorded log record.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedLog {
    pub level: LogLevel,
    pub message: String,
    pub fields: Vec<(String, AttrValue)>,
}

#[derive(Debug, Default)]
struct CaptureState {
    spans: Vec<CapturedSpan>,
    metrics: Vec<MetricWrite>,
    logs: Vec<CapturedLog>,
}

/// Emitter that records spans, metric writes, and logs in memory.
#[derive(Debug, Clone, Default)]
pub struct CaptureEmitter {
    state: Arc<Mutex<CaptureState>>,
}

impl CaptureEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spans(&self) -> Vec<CapturedSpan> {
        self.state.lock().unwrap().spans.clone()
    }

    pub fn metrics(&self) -> Vec<MetricWrite> {
        self.state.lock().unwrap().metrics.clone()
    }

    pub fn logs(&self) -> Vec<CapturedLog> {
        self.state.lock().unwrap().logs.clone()
    }

    pub fn metrics_for(&self, instrument: Instrument) -> Vec<MetricWrite> {
        self.metrics()
            .into_iter()
            .filter(|m| m.instrument == instrument)
            .collect()
    }

    fn record_metric(&self, instrument: Instrument, value: f64, labels: &[(&'static str, String)]) {
        self.state.lock().unwrap().metrics.push(MetricWrite {
            instrument,
            value,
            labels: labels
                .iter()
                .map(|(k, v)| ((*k).to_owned(), v.clone()))
                .collect(),
        });
    }
}

impl Emitter for CaptureEmitter {
    fn start_span(&self, name: &str) -> Box<dyn SpanHandle> {
        let index = {
            let mut state = self.state.lock().unwrap();
            state.spans.push(CapturedSpan {
                name: name.to_owned(),
                attributes: Vec::new(),
                status: CapturedStatus::Unset,
                end_count: 0,
            });
            state.spans.len() - 1
        };
        Box::new(CaptureSpan {
            state: Arc::clone(&self.state),
            index,
        })
    }

    fn incr_requests(&self, labels: &[(&'static str, String)]) {
        self.record_metric(Instrument::Requests, 1.0, labels);
    }

    fn record_duration(&self, seconds: f64, labels: &[(&'static str, String)]) {
        self.record_metric(Instrument::Duration, seconds, labels);
    }

    fn add_active_users(&self, delta: i64, labels: &[(&'static str, String)]) {
        self.record_metric(Instrument::ActiveUsers, delta as f64, labels);
    }

    fn incr_errors(&self, labels: &[(&'static str, String)]) {
        self.record_metric(Instrument::Errors, 1.0, labels);
    }

    fn emit_log(&self, level: LogLevel, message: &str, fields: &[(&'static str, AttrValue)]) {
        self.state.lock().unwrap().logs.push(CapturedLog {
            level,
            message: message.to_owned(),
            fields: fields
                .iter()
                .map(|(k, v)| ((*k).to_owned(), v.clone()))
                .collect(),
        });
    }
}

struct CaptureSpan {
    state: Arc<Mutex<CaptureState>>,
    index: usize,
}

impl SpanHandle for CaptureSpan {
    fn set_attribute(&mut self, key: &'static str, value: AttrValue) {
        self.state.lock().unwrap().spans[self.index]
            .attributes
            .push((key.to_owned(), value));
    }

    fn set_error(&mut self, message: &str) {
        self.state.lock().unwrap().spans[self.index].status =
            CapturedStatus::Error(message.to_owned());
    }

    fn end(&mut self) {
        self.state.lock().unwrap().spans[self.index].end_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_span_lifecycle() {
        let capture = CaptureEmitter::new();
        let mut span = capture.start_span("handle_login");
        span.set_attribute("user.id", AttrValue::Str("alice".into()));
        span.set_error("timeout occurred");
        span.end();

        let spans = capture.spans();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].name, "handle_login");
        assert_eq!(spans[0].end_count, 1);
        assert_eq!(
            spans[0].status,
            CapturedStatus::Error("timeout occurred".into())
        );
    }

    #[test]
    fn records_metric_writes_per_instrument() {
        let capture = CaptureEmitter::new();
        capture.incr_requests(&[("operation", "login".into())]);
        capture.add_active_users(-1, &[("operation", "login".into())]);

        assert_eq!(capture.metrics_for(Instrument::Requests).len(), 1);
        let churn = capture.metrics_for(Instrument::ActiveUsers);
        assert_eq!(churn.len(), 1);
        assert_eq!(churn[0].value, -1.0);
    }
}
