//! Observability for the ingestion engine
//!
//! Provides:
//! - Prometheus metrics (round latency, rounds, fetch and sink failures, window size)
//! - Structured event logging with tracing

use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge_vec, HistogramVec,
    IntCounterVec, IntGaugeVec,
};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{error, info, warn};

/// Histogram buckets for round latency (in seconds)
const ROUND_LATENCY_BUCKETS: &[f64] = &[0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<Option<IngestMetricsInner>> = OnceLock::new();

struct IngestMetricsInner {
    round_latency_seconds: HistogramVec,
    rounds_total: IntCounterVec,
    fetch_failures_total: IntCounterVec,
    sink_write_failures_total: IntCounterVec,
    window_size: IntGaugeVec,
}

impl IngestMetricsInner {
    fn register() -> prometheus::Result<Self> {
        Ok(Self {
            round_latency_seconds: register_histogram_vec!(
                "livefeed_round_latency_seconds",
                "Time spent fetching and publishing one round",
                &["domain"],
                ROUND_LATENCY_BUCKETS.to_vec()
            )?,
            rounds_total: register_int_counter_vec!(
                "livefeed_rounds_total",
                "Rounds completed per domain",
                &["domain"]
            )?,
            fetch_failures_total: register_int_counter_vec!(
                "livefeed_fetch_failures_total",
                "Upstream fetches that failed or timed out",
                &["domain"]
            )?,
            sink_write_failures_total: register_int_counter_vec!(
                "livefeed_sink_write_failures_total",
                "Rounds whose sink write failed",
                &["domain"]
            )?,
            window_size: register_int_gauge_vec!(
                "livefeed_window_size",
                "Readings currently held in the sliding window",
                &["domain"]
            )?,
        })
    }
}

/// Lightweight handle to the global ingestion metrics
///
/// Clones share the same underlying collectors. If registration fails the
/// handle silently records nothing.
#[derive(Clone)]
pub struct IngestMetrics {
    _private: (),
}

impl Default for IngestMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl IngestMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(|| match IngestMetricsInner::register() {
            Ok(inner) => Some(inner),
            Err(e) => {
                warn!(error = %e, "Failed to register ingestion metrics");
                None
            }
        });
        Self { _private: () }
    }

    fn inner(&self) -> Option<&IngestMetricsInner> {
        GLOBAL_METRICS.get().and_then(Option::as_ref)
    }

    pub fn observe_round(&self, domain: &str, elapsed: Duration) {
        if let Some(m) = self.inner() {
            m.round_latency_seconds
                .with_label_values(&[domain])
                .observe(elapsed.as_secs_f64());
            m.rounds_total.with_label_values(&[domain]).inc();
        }
    }

    pub fn inc_fetch_failures(&self, domain: &str, count: u64) {
        if let Some(m) = self.inner() {
            m.fetch_failures_total
                .with_label_values(&[domain])
                .inc_by(count);
        }
    }

    pub fn inc_sink_write_failures(&self, domain: &str) {
        if let Some(m) = self.inner() {
            m.sink_write_failures_total.with_label_values(&[domain]).inc();
        }
    }

    pub fn set_window_size(&self, domain: &str, size: usize) {
        if let Some(m) = self.inner() {
            m.window_size
                .with_label_values(&[domain])
                .set(size as i64);
        }
    }
}

/// Structured logger for ingestion events
///
/// Every record carries an `event` tag and the domain so log pipelines can
/// group by loop.
#[derive(Clone)]
pub struct StructuredLogger {
    domain: String,
}

impl StructuredLogger {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
        }
    }

    pub fn log_started(
        &self,
        entities: usize,
        capacity: usize,
        interval: Duration,
        max_rounds: Option<u64>,
    ) {
        info!(
            event = "ingest_started",
            domain = %self.domain,
            entities = entities,
            capacity = capacity,
            interval_secs = interval.as_secs(),
            max_rounds = ?max_rounds,
            "Ingestion loop started"
        );
    }

    pub fn log_round(
        &self,
        round: u64,
        readings: usize,
        fetch_failures: usize,
        window: usize,
        elapsed: Duration,
    ) {
        info!(
            event = "round_completed",
            domain = %self.domain,
            round = round,
            readings = readings,
            fetch_failures = fetch_failures,
            window = window,
            elapsed_ms = elapsed.as_millis() as u64,
            "Round published"
        );
    }

    pub fn log_fetch_failure(
        &self,
        round: u64,
        entity: &str,
        source: &str,
        error: &dyn std::fmt::Display,
    ) {
        warn!(
            event = "fetch_failed",
            domain = %self.domain,
            round = round,
            entity = %entity,
            source = %source,
            error = %error,
            "Fetch failed, applying fallback policy"
        );
    }

    pub fn log_sink_failure(&self, round: u64, error: &dyn std::fmt::Display) {
        error!(
            event = "sink_write_failed",
            domain = %self.domain,
            round = round,
            error = %error,
            "Sink write failed, window retained for next round"
        );
    }

    pub fn log_schedule_fault(&self, round: u64, error: &dyn std::fmt::Display) {
        error!(
            event = "schedule_fault",
            domain = %self.domain,
            round = round,
            error = %error,
            "Round aborted unexpectedly, loop continues"
        );
    }

    pub fn log_stopped(&self, rounds_completed: u64, reason: &str) {
        info!(
            event = "ingest_shutdown",
            domain = %self.domain,
            rounds_completed = rounds_completed,
            reason = %reason,
            "Ingestion loop stopped"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_handles_share_registry() {
        let metrics = IngestMetrics::new();
        let other = IngestMetrics::new();

        metrics.observe_round("test-domain", Duration::from_millis(20));
        other.inc_fetch_failures("test-domain", 2);
        other.inc_sink_write_failures("test-domain");
        metrics.set_window_size("test-domain", 7);

        let families = prometheus::gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "livefeed_rounds_total"));
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("stocks");
        assert_eq!(logger.domain, "stocks");
    }
}
