//! Metrics sink port

use compass_domain::Verdict;

/// Sink for pipeline counters
///
/// The production implementation is the Prometheus-style collector in the
/// infrastructure layer; [`NoMetrics`] is the no-op default.
pub trait MetricsSink: Send + Sync {
    /// One inbound HTTP request hit the façade.
    fn record_request(&self);

    /// One model dispatch completed.
    fn record_model_call(&self, model: &str, success: bool, latency_ms: u64);

    /// One full pipeline pass completed.
    ///
    /// `latency_ms` is the maximum of the per-model latencies — the
    /// parallel lower bound, not the sum.
    fn record_query(&self, success: bool, latency_ms: u64, verdict: Verdict);

    /// A query was rejected before fan-out (guardrail block).
    fn record_rejected(&self);
}

/// No-op metrics sink
pub struct NoMetrics;

impl MetricsSink for NoMetrics {
    fn record_request(&self) {}
    fn record_model_call(&self, _model: &str, _success: bool, _latency_ms: u64) {}
    fn record_query(&self, _success: bool, _latency_ms: u64, _verdict: Verdict) {}
    fn record_rejected(&self) {}
}
