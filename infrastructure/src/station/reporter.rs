//! Resource metrics reporter
//!
//! Samples process CPU and memory and posts them with the request
//! counters to the Station's metrics channel every 60 seconds. This is
//! the only channel that carries resource data; heartbeats stay
//! liveness-only.

use super::client::{MetricsBody, StationClient};
use crate::metrics::MetricsCollector;
use std::sync::Arc;
use std::time::Duration;
use sysinfo::System;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Reporting cadence.
const REPORT_INTERVAL: Duration = Duration::from_secs(60);

/// Periodic resource/metrics reporter
pub struct MetricsReporter {
    station: Arc<StationClient>,
    collector: Arc<MetricsCollector>,
    system: Mutex<System>,
}

impl MetricsReporter {
    pub fn new(station: Arc<StationClient>, collector: Arc<MetricsCollector>) -> Self {
        Self {
            station,
            collector,
            system: Mutex::new(System::new()),
        }
    }

    /// Sample this process's CPU share and resident memory.
    async fn sample_resources(&self) -> (f64, u64) {
        let pid = sysinfo::Pid::from_u32(std::process::id());
        let mut system = self.system.lock().await;
        system.refresh_all();
        match system.process(pid) {
            Some(process) => (
                process.cpu_usage() as f64,
                process.memory() / (1024 * 1024),
            ),
            None => (0.0, 0),
        }
    }

    /// Build and send one metrics report.
    pub async fn report_once(&self) {
        let (cpu_percent, memory_mb) = self.sample_resources().await;
        let snapshot = self.collector.snapshot();

        let body = MetricsBody {
            cpu_percent,
            memory_mb,
            requests_handled: snapshot.requests_total,
            custom_metrics: serde_json::json!({
                "queries_total": snapshot.queries_total,
                "consensus_unanimous": snapshot.consensus_unanimous,
                "consensus_split": snapshot.consensus_split,
                "consensus_no_consensus": snapshot.consensus_no_consensus,
                "model_calls_total": snapshot.model_calls_total,
                "model_call_failures": snapshot.model_call_failures,
                "router_cost_usd": snapshot.router_cost_usd,
                "router_cache_hits": snapshot.router_cache_hits,
            }),
        };

        if let Err(e) = self.station.post_metrics(&body).await {
            warn!("failed to deliver metrics report: {e}");
        }
    }

    /// Report every 60 s until cancelled.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(REPORT_INTERVAL) => {}
            }
            self.report_once().await;
        }
        info!("metrics reporter stopped");
    }
}
