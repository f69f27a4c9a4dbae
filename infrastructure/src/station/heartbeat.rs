//! Liveness heartbeat loop
//!
//! Heartbeats carry mode and uptime only — never resource data. Cadence
//! follows the mode: EMERGENCY every 5 s, IDLE every 30 s, SLEEP every
//! 900 s. Three consecutive delivery failures force EMERGENCY mode and
//! mark the agent unhealthy until a heartbeat lands again.

use super::client::StationClient;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Consecutive failures that trigger the EMERGENCY escalation.
const MAX_CONSECUTIVE_FAILURES: u32 = 3;

/// Heartbeat cadence mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HeartbeatMode {
    Emergency,
    Idle,
    Sleep,
}

impl HeartbeatMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeartbeatMode::Emergency => "EMERGENCY",
            HeartbeatMode::Idle => "IDLE",
            HeartbeatMode::Sleep => "SLEEP",
        }
    }

    /// Beat interval for this mode.
    pub fn interval(&self) -> Duration {
        match self {
            HeartbeatMode::Emergency => Duration::from_secs(5),
            HeartbeatMode::Idle => Duration::from_secs(30),
            HeartbeatMode::Sleep => Duration::from_secs(900),
        }
    }
}

impl std::fmt::Display for HeartbeatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Heartbeat state machine and sender loop
pub struct Heartbeater {
    station: Arc<StationClient>,
    mode: RwLock<HeartbeatMode>,
    consecutive_failures: AtomicU32,
    healthy: AtomicBool,
    started_at: Instant,
}

impl Heartbeater {
    pub fn new(station: Arc<StationClient>) -> Self {
        Self {
            station,
            mode: RwLock::new(HeartbeatMode::Idle),
            consecutive_failures: AtomicU32::new(0),
            healthy: AtomicBool::new(true),
            started_at: Instant::now(),
        }
    }

    /// Whether the last heartbeats were delivered.
    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Relaxed)
    }

    pub async fn mode(&self) -> HeartbeatMode {
        *self.mode.read().await
    }

    /// Switch to SLEEP cadence (e.g. while draining).
    pub async fn set_sleep(&self) {
        *self.mode.write().await = HeartbeatMode::Sleep;
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// Send one heartbeat and update the failure bookkeeping.
    pub async fn beat(&self) {
        let mode = *self.mode.read().await;
        match self
            .station
            .post_heartbeat(mode.as_str(), self.uptime_seconds())
            .await
        {
            Ok(()) => {
                self.consecutive_failures.store(0, Ordering::Relaxed);
                self.healthy.store(true, Ordering::Relaxed);
                if mode == HeartbeatMode::Emergency {
                    *self.mode.write().await = HeartbeatMode::Idle;
                    info!("heartbeat recovered, leaving EMERGENCY mode");
                }
            }
            Err(e) => {
                let failures = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(failures, "heartbeat delivery failed: {e}");
                if failures >= MAX_CONSECUTIVE_FAILURES {
                    self.healthy.store(false, Ordering::Relaxed);
                    let mut mode = self.mode.write().await;
                    if *mode != HeartbeatMode::Emergency {
                        *mode = HeartbeatMode::Emergency;
                        error!("{failures} consecutive heartbeat failures, entering EMERGENCY mode");
                    }
                }
            }
        }
    }

    /// Beat at the mode's cadence until cancelled.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        loop {
            let interval = self.mode().await.interval();
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
            self.beat().await;
        }
        info!("heartbeat loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_cadence() {
        assert_eq!(HeartbeatMode::Emergency.interval(), Duration::from_secs(5));
        assert_eq!(HeartbeatMode::Idle.interval(), Duration::from_secs(30));
        assert_eq!(HeartbeatMode::Sleep.interval(), Duration::from_secs(900));
    }

    #[tokio::test]
    async fn test_three_failures_force_emergency() {
        // Unroutable station: every beat fails.
        let station = Arc::new(StationClient::new("http://127.0.0.1:1", "test-agent").unwrap());
        let heartbeater = Heartbeater::new(station);

        heartbeater.beat().await;
        heartbeater.beat().await;
        assert!(heartbeater.is_healthy());
        assert_eq!(heartbeater.mode().await, HeartbeatMode::Idle);

        heartbeater.beat().await;
        assert!(!heartbeater.is_healthy());
        assert_eq!(heartbeater.mode().await, HeartbeatMode::Emergency);
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let station = Arc::new(StationClient::new("http://127.0.0.1:1", "test-agent").unwrap());
        let heartbeater = Arc::new(Heartbeater::new(station));
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(Arc::clone(&heartbeater).run(cancel.clone()));
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("loop must exit promptly")
            .unwrap();
    }
}
