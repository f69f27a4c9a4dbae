//! Process-wide metrics collector
//!
//! Plain atomic counters behind the application's `MetricsSink` port, with
//! a Prometheus text exposition for `/metrics` and a JSON snapshot for
//! `/status` and the Station metrics channel.

use crate::router::protocol::CallMetadata;
use compass_application::MetricsSink;
use compass_domain::Verdict;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter collector shared across the façade and the pipeline
#[derive(Default)]
pub struct MetricsCollector {
    requests_total: AtomicU64,
    queries_total: AtomicU64,
    queries_successful: AtomicU64,
    queries_failed: AtomicU64,
    consensus_unanimous: AtomicU64,
    consensus_split: AtomicU64,
    consensus_no_consensus: AtomicU64,
    model_calls_total: AtomicU64,
    model_call_failures: AtomicU64,
    query_latency_ms_sum: AtomicU64,
    router_cost_micro_usd: AtomicU64,
    router_cache_hits: AtomicU64,
}

/// Serializable snapshot of every counter
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub queries_total: u64,
    pub queries_successful: u64,
    pub queries_failed: u64,
    pub consensus_unanimous: u64,
    pub consensus_split: u64,
    pub consensus_no_consensus: u64,
    pub model_calls_total: u64,
    pub model_call_failures: u64,
    pub query_latency_ms_sum: u64,
    pub router_cost_usd: f64,
    pub router_cache_hits: u64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one router call's billing metadata into the custom counters.
    pub fn record_router_call(&self, metadata: &CallMetadata) {
        if let Some(cost) = metadata.cost_usd {
            let micro = (cost * 1_000_000.0).round() as u64;
            self.router_cost_micro_usd.fetch_add(micro, Ordering::Relaxed);
        }
        if metadata.cache_hit {
            self.router_cache_hits.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn requests_handled(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            queries_total: self.queries_total.load(Ordering::Relaxed),
            queries_successful: self.queries_successful.load(Ordering::Relaxed),
            queries_failed: self.queries_failed.load(Ordering::Relaxed),
            consensus_unanimous: self.consensus_unanimous.load(Ordering::Relaxed),
            consensus_split: self.consensus_split.load(Ordering::Relaxed),
            consensus_no_consensus: self.consensus_no_consensus.load(Ordering::Relaxed),
            model_calls_total: self.model_calls_total.load(Ordering::Relaxed),
            model_call_failures: self.model_call_failures.load(Ordering::Relaxed),
            query_latency_ms_sum: self.query_latency_ms_sum.load(Ordering::Relaxed),
            router_cost_usd: self.router_cost_micro_usd.load(Ordering::Relaxed) as f64
                / 1_000_000.0,
            router_cache_hits: self.router_cache_hits.load(Ordering::Relaxed),
        }
    }

    /// Prometheus text exposition for the `/metrics` endpoint.
    pub fn render_prometheus(&self) -> String {
        let s = self.snapshot();
        let mut out = String::new();
        let mut counter = |name: &str, help: &str, value: u64| {
            out.push_str(&format!(
                "# HELP {name} {help}\n# TYPE {name} counter\n{name} {value}\n"
            ));
        };
        counter(
            "compass_queries_total",
            "Total jury queries processed",
            s.queries_total,
        );
        counter(
            "compass_queries_successful_total",
            "Jury queries with at least one usable answer",
            s.queries_successful,
        );
        counter(
            "compass_queries_failed_total",
            "Jury queries with no usable outcome",
            s.queries_failed,
        );
        counter(
            "compass_requests_total",
            "HTTP requests handled by the facade",
            s.requests_total,
        );
        counter(
            "compass_consensus_unanimous_total",
            "Queries that reached a unanimous verdict",
            s.consensus_unanimous,
        );
        counter(
            "compass_consensus_split_total",
            "Queries that reached a split verdict",
            s.consensus_split,
        );
        counter(
            "compass_consensus_no_consensus_total",
            "Queries that reached no consensus",
            s.consensus_no_consensus,
        );
        out
    }
}

impl MetricsSink for MetricsCollector {
    fn record_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    fn record_model_call(&self, _model: &str, success: bool, _latency_ms: u64) {
        self.model_calls_total.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.model_call_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn record_query(&self, success: bool, latency_ms: u64, verdict: Verdict) {
        self.queries_total.fetch_add(1, Ordering::Relaxed);
        if success {
            self.queries_successful.fetch_add(1, Ordering::Relaxed);
        } else {
            self.queries_failed.fetch_add(1, Ordering::Relaxed);
        }
        self.query_latency_ms_sum
            .fetch_add(latency_ms, Ordering::Relaxed);
        let counter = match verdict {
            Verdict::Unanimous => &self.consensus_unanimous,
            Verdict::Split => &self.consensus_split,
            Verdict::NoConsensus => &self.consensus_no_consensus,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn record_rejected(&self) {
        self.queries_total.fetch_add(1, Ordering::Relaxed);
        self.queries_failed.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_counters() {
        let collector = MetricsCollector::new();
        collector.record_query(true, 800, Verdict::Unanimous);
        collector.record_query(true, 400, Verdict::Split);
        collector.record_query(false, 0, Verdict::NoConsensus);
        collector.record_rejected();

        let s = collector.snapshot();
        assert_eq!(s.queries_total, 4);
        assert_eq!(s.queries_successful, 2);
        assert_eq!(s.queries_failed, 2);
        assert_eq!(s.consensus_unanimous, 1);
        assert_eq!(s.consensus_split, 1);
        assert_eq!(s.consensus_no_consensus, 1);
        assert_eq!(s.query_latency_ms_sum, 1200);
    }

    #[test]
    fn test_router_cost_accumulates() {
        let collector = MetricsCollector::new();
        collector.record_router_call(&CallMetadata {
            cost_usd: Some(0.01),
            latency_ms: Some(500),
            provider: None,
            cache_hit: true,
        });
        collector.record_router_call(&CallMetadata {
            cost_usd: Some(0.0025),
            ..Default::default()
        });

        let s = collector.snapshot();
        assert!((s.router_cost_usd - 0.0125).abs() < 1e-9);
        assert_eq!(s.router_cache_hits, 1);
    }

    #[test]
    fn test_prometheus_exposition_names() {
        let collector = MetricsCollector::new();
        collector.record_request();
        collector.record_query(true, 100, Verdict::Unanimous);

        let text = collector.render_prometheus();
        assert!(text.contains("compass_queries_total 1"));
        assert!(text.contains("compass_requests_total 1"));
        assert!(text.contains("compass_consensus_unanimous_total 1"));
        assert!(text.contains("# TYPE compass_queries_failed_total counter"));
    }
}
