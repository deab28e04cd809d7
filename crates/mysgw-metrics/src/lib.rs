//! Metrics for the sensor gateway bridge.
//!
//! Every metric the gateway emits is declared once here as a [`Metric`]
//! constant so call sites cannot misspell a name, and so the whole set can be
//! described to the installed recorder at startup.
//!
//! # Example
//!
//! ```rust
//! use mysgw_metrics::{metric_defs, LinkLabels};
//!
//! let labels = LinkLabels::new("network", "192.168.1.50:5003");
//! metrics::counter!(metric_defs::FRAMES_RECEIVED.name, &labels.to_labels()).increment(1);
//! ```

pub use metrics;

use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};

/// The kind of metric (counter, gauge, or histogram).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Monotonically increasing.
    Counter,
    /// Can go up and down.
    Gauge,
    /// Distribution of samples.
    Histogram,
}

impl MetricKind {
    /// Lowercase name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metric declaration with its metadata.
///
/// ```rust
/// use mysgw_metrics::{Metric, MetricKind};
/// use metrics::Unit;
///
/// const REPLIES: Metric = Metric::counter("mysgw.example.replies")
///     .with_description("Replies written")
///     .with_unit(Unit::Count)
///     .with_labels(&["sub_type"]);
///
/// assert_eq!(REPLIES.kind, MetricKind::Counter);
/// ```
#[derive(Debug, Clone)]
pub struct Metric {
    /// Dotted metric name.
    pub name: &'static str,
    /// Counter, gauge or histogram.
    pub kind: MetricKind,
    /// One-line description.
    pub description: &'static str,
    /// Unit of measurement, if any.
    pub unit: Option<Unit>,
    /// Label keys the call sites attach.
    pub labels: &'static [&'static str],
}

impl Metric {
    const fn new(name: &'static str, kind: MetricKind) -> Self {
        Self { name, kind, description: "", unit: None, labels: &[] }
    }

    /// A counter named `name`.
    pub const fn counter(name: &'static str) -> Self {
        Self::new(name, MetricKind::Counter)
    }

    /// A gauge named `name`.
    pub const fn gauge(name: &'static str) -> Self {
        Self::new(name, MetricKind::Gauge)
    }

    /// A histogram named `name`.
    pub const fn histogram(name: &'static str) -> Self {
        Self::new(name, MetricKind::Histogram)
    }

    /// Set the description.
    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Set the unit.
    pub const fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Set the expected label keys.
    pub const fn with_labels(mut self, labels: &'static [&'static str]) -> Self {
        self.labels = labels;
        self
    }

    /// Register the description with the installed recorder.
    pub fn describe(&self) {
        match (self.kind, self.unit) {
            (MetricKind::Counter, Some(unit)) => describe_counter!(self.name, unit, self.description),
            (MetricKind::Counter, None) => describe_counter!(self.name, self.description),
            (MetricKind::Gauge, Some(unit)) => describe_gauge!(self.name, unit, self.description),
            (MetricKind::Gauge, None) => describe_gauge!(self.name, self.description),
            (MetricKind::Histogram, Some(unit)) => {
                describe_histogram!(self.name, unit, self.description)
            }
            (MetricKind::Histogram, None) => describe_histogram!(self.name, self.description),
        }
    }
}

/// All metric definitions for the gateway.
pub mod metric_defs {
    use super::{Metric, Unit};

    // ========================================================================
    // Label Keys
    // ========================================================================

    /// Labels present on every link-scoped metric.
    pub const LINK_LABELS: &[&str] = &["transport", "endpoint"];

    // ========================================================================
    // Link Metrics
    // ========================================================================

    /// Frames decoded and delivered to the handler.
    pub const FRAMES_RECEIVED: Metric = Metric::counter("mysgw.link.frames_received")
        .with_description("Frames decoded and delivered")
        .with_unit(Unit::Count)
        .with_labels(LINK_LABELS);

    /// Frames written to the gateway.
    pub const FRAMES_SENT: Metric = Metric::counter("mysgw.link.frames_sent")
        .with_description("Frames written to the gateway")
        .with_unit(Unit::Count)
        .with_labels(LINK_LABELS);

    /// Lines that failed to decode.
    ///
    /// Labels: transport, endpoint, reason (`parse` or `protocol`)
    pub const FRAMES_DROPPED: Metric = Metric::counter("mysgw.link.frames_dropped")
        .with_description("Received lines that failed to decode")
        .with_unit(Unit::Count)
        .with_labels(&["transport", "endpoint", "reason"]);

    /// Unterminated input thrown away by the line codec.
    pub const BYTES_DISCARDED: Metric = Metric::counter("mysgw.link.bytes_discarded")
        .with_description("Unterminated input discarded by the line codec")
        .with_unit(Unit::Bytes)
        .with_labels(LINK_LABELS);

    /// Writes that hit an I/O error.
    pub const WRITE_FAILURES: Metric = Metric::counter("mysgw.link.write_failures")
        .with_description("Writes that failed with an I/O error")
        .with_unit(Unit::Count)
        .with_labels(LINK_LABELS);

    // ========================================================================
    // Gateway Metrics
    // ========================================================================

    /// Whether a link is currently open (1) or absent (0).
    pub const LINK_UP: Metric = Metric::gauge("mysgw.gateway.link_up")
        .with_description("1 while a link is open, 0 while absent");

    /// Links torn down by the health check.
    pub const RECONNECTS: Metric = Metric::counter("mysgw.gateway.reconnects")
        .with_description("Links torn down and reopened by the health check")
        .with_unit(Unit::Count);

    /// Failed attempts to open a link.
    pub const CONNECT_FAILURES: Metric = Metric::counter("mysgw.gateway.connect_failures")
        .with_description("Attempts to open a link that failed")
        .with_unit(Unit::Count);

    /// Inbound values posted to the state store.
    ///
    /// Labels: value_type
    pub const VALUES_FORWARDED: Metric = Metric::counter("mysgw.gateway.values_forwarded")
        .with_description("Inbound values posted to the state store")
        .with_unit(Unit::Count)
        .with_labels(&["value_type"]);

    /// Values that could not be converted in either direction.
    ///
    /// Labels: value_type, direction (`inbound` or `outbound`)
    pub const CONVERSION_FAILURES: Metric = Metric::counter("mysgw.gateway.conversion_failures")
        .with_description("Values that could not be converted")
        .with_unit(Unit::Count)
        .with_labels(&["value_type", "direction"]);

    /// Frames with no bound item.
    pub const UNROUTED: Metric = Metric::counter("mysgw.gateway.unrouted")
        .with_description("Frames dropped because no item is bound to them")
        .with_unit(Unit::Count);

    /// Replies written in response to inbound frames.
    ///
    /// Labels: sub_type
    pub const REPLIES_SENT: Metric = Metric::counter("mysgw.gateway.replies_sent")
        .with_description("Replies and acknowledgements written")
        .with_unit(Unit::Count)
        .with_labels(&["sub_type"]);

    /// Outbound commands written.
    pub const COMMANDS_SENT: Metric = Metric::counter("mysgw.gateway.commands_sent")
        .with_description("Host commands written to the gateway")
        .with_unit(Unit::Count);

    /// Time spent handling one inbound frame.
    pub const DISPATCH_TIME: Metric = Metric::histogram("mysgw.gateway.dispatch_time_us")
        .with_description("Time spent routing one inbound frame")
        .with_unit(Unit::Microseconds);

    /// Every metric, for [`super::describe_metrics`].
    pub const ALL: &[&Metric] = &[
        // Link
        &FRAMES_RECEIVED,
        &FRAMES_SENT,
        &FRAMES_DROPPED,
        &BYTES_DISCARDED,
        &WRITE_FAILURES,
        // Gateway
        &LINK_UP,
        &RECONNECTS,
        &CONNECT_FAILURES,
        &VALUES_FORWARDED,
        &CONVERSION_FAILURES,
        &UNROUTED,
        &REPLIES_SENT,
        &COMMANDS_SENT,
        &DISPATCH_TIME,
    ];
}

/// Labels identifying one link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkLabels {
    /// `serial` or `network`.
    pub transport: &'static str,
    /// Device path or `host:port`.
    pub endpoint: String,
}

impl LinkLabels {
    /// Labels for a link of `transport` kind connected to `endpoint`.
    pub fn new(transport: &'static str, endpoint: impl Into<String>) -> Self {
        Self { transport, endpoint: endpoint.into() }
    }

    /// Labels in the `metrics` crate format.
    pub fn to_labels(&self) -> Vec<(&'static str, String)> {
        vec![("transport", self.transport.to_string()), ("endpoint", self.endpoint.clone())]
    }

    /// Labels with extra key-value pairs appended.
    pub fn with(&self, extra: &[(&'static str, String)]) -> Vec<(&'static str, String)> {
        let mut labels = self.to_labels();
        labels.extend_from_slice(extra);
        labels
    }
}

/// Describe every gateway metric to the installed recorder.
///
/// Call once at startup, after the recorder is installed.
pub fn describe_metrics() {
    for metric in metric_defs::ALL {
        metric.describe();
    }
}

/// Install a Prometheus recorder serving scrapes on `addr`.
#[cfg(feature = "prometheus")]
pub fn install_prometheus(
    addr: std::net::SocketAddr,
) -> Result<(), metrics_exporter_prometheus::BuildError> {
    metrics_exporter_prometheus::PrometheusBuilder::new().with_http_listener(addr).install()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_labels() {
        let labels = LinkLabels::new("serial", "/dev/ttyUSB0");
        let label_vec = labels.to_labels();
        assert_eq!(label_vec.len(), 2);
        assert!(label_vec.contains(&("transport", "serial".to_string())));
        assert!(label_vec.contains(&("endpoint", "/dev/ttyUSB0".to_string())));
    }

    #[test]
    fn test_link_labels_with_reason() {
        let labels = LinkLabels::new("network", "10.0.0.2:5003");
        let extended = labels.with(&[("reason", "parse".to_string())]);
        assert_eq!(extended.len(), 3);
        assert_eq!(extended[2], ("reason", "parse".to_string()));
    }

    #[test]
    fn test_metric_definitions() {
        assert_eq!(metric_defs::FRAMES_RECEIVED.name, "mysgw.link.frames_received");
        assert_eq!(metric_defs::FRAMES_RECEIVED.labels, metric_defs::LINK_LABELS);
        assert_eq!(metric_defs::LINK_UP.kind, MetricKind::Gauge);
        assert_eq!(metric_defs::DISPATCH_TIME.kind, MetricKind::Histogram);
        assert_eq!(metric_defs::DISPATCH_TIME.unit, Some(Unit::Microseconds));
        assert_eq!(metric_defs::BYTES_DISCARDED.unit, Some(Unit::Bytes));
    }

    #[test]
    fn test_all_names_unique() {
        let mut names: Vec<&str> = metric_defs::ALL.iter().map(|m| m.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), metric_defs::ALL.len());
        assert_eq!(metric_defs::ALL.len(), 14);
    }

    #[test]
    fn test_every_metric_is_described() {
        for metric in metric_defs::ALL {
            assert!(!metric.description.is_empty(), "{} has no description", metric.name);
            assert!(metric.name.starts_with("mysgw."));
        }
    }

    #[test]
    fn test_metric_minimal() {
        const MINIMAL: Metric = Metric::counter("minimal");
        assert_eq!(MINIMAL.kind, MetricKind::Counter);
        assert_eq!(MINIMAL.description, "");
        assert_eq!(MINIMAL.unit, None);
        assert_eq!(MINIMAL.labels, &[] as &[&str]);
    }

    #[test]
    fn test_describe_without_recorder() {
        // No recorder installed: describing is a no-op and must not panic.
        describe_metrics();
    }
}
