//! Observability infrastructure for the exporter itself
//!
//! Provides:
//! - Prometheus metrics about the watch stream and scrapes
//! - Structured JSON logging with tracing

use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for scrape durations (in seconds)
const SCRAPE_BUCKETS: &[f64] = &[0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ExporterMetricsInner> = OnceLock::new();

struct ExporterMetricsInner {
    watch_events: IntCounterVec,
    watch_errors: IntCounter,
    objects: IntGauge,
    scrape_duration_seconds: Histogram,
}

impl ExporterMetricsInner {
    fn new() -> Self {
        Self {
            watch_events: register_int_counter_vec!(
                "vpa_exporter_watch_events_total",
                "Watch events received for VerticalPodAutoscaler objects",
                &["event"]
            )
            .expect("Failed to register watch_events"),

            watch_errors: register_int_counter!(
                "vpa_exporter_watch_errors_total",
                "Errors returned by the VerticalPodAutoscaler watch stream"
            )
            .expect("Failed to register watch_errors"),

            objects: register_int_gauge!(
                "vpa_exporter_objects",
                "VerticalPodAutoscaler objects seen at the last scrape"
            )
            .expect("Failed to register objects"),

            scrape_duration_seconds: register_histogram!(
                "vpa_exporter_scrape_duration_seconds",
                "Time spent generating VerticalPodAutoscaler metrics for one scrape",
                SCRAPE_BUCKETS.to_vec()
            )
            .expect("Failed to register scrape_duration_seconds"),
        }
    }
}

/// Handle to the exporter's own metrics
///
/// Clones share the same globally registered metrics.
#[derive(Clone)]
pub struct ExporterMetrics {
    _private: (),
}

impl Default for ExporterMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ExporterMetrics {
    /// Create a new metrics handle (registers the metrics on first call)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ExporterMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ExporterMetricsInner {
        GLOBAL_METRICS.get_or_init(ExporterMetricsInner::new)
    }

    /// Count one watch event (`applied`, `deleted` or `restarted`)
    pub fn inc_watch_event(&self, event: &str) {
        self.inner().watch_events.with_label_values(&[event]).inc();
    }

    pub fn inc_watch_errors(&self) {
        self.inner().watch_errors.inc();
    }

    pub fn set_objects(&self, count: i64) {
        self.inner().objects.set(count);
    }

    pub fn observe_scrape_duration(&self, duration_secs: f64) {
        self.inner().scrape_duration_seconds.observe(duration_secs);
    }
}

/// Structured logger for exporter lifecycle events
#[derive(Clone)]
pub struct StructuredLogger {
    scope: String,
}

impl StructuredLogger {
    /// `scope` is the watched namespace, empty for all namespaces
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
        }
    }

    fn scope(&self) -> &str {
        if self.scope.is_empty() {
            "<all>"
        } else {
            &self.scope
        }
    }

    pub fn log_startup(&self, version: &str, port: u16) {
        info!(
            event = "exporter_started",
            namespace = %self.scope(),
            exporter_version = %version,
            port = port,
            "VPA metrics exporter started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "exporter_shutdown",
            namespace = %self.scope(),
            reason = %reason,
            "VPA metrics exporter shutting down"
        );
    }

    /// The watcher relisted and the store now holds `objects` items
    pub fn log_watch_restarted(&self, objects: usize) {
        info!(
            event = "watch_restarted",
            namespace = %self.scope(),
            objects = objects,
            "VerticalPodAutoscaler list refreshed"
        );
    }

    pub fn log_watch_error(&self, error: &str) {
        warn!(
            event = "watch_error",
            namespace = %self.scope(),
            error = %error,
            "VerticalPodAutoscaler watch failed, backing off"
        );
    }
}
