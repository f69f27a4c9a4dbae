//! HTTP client for the Station control plane
//!
//! Carries lifecycle events, heartbeats, and resource metrics. Heartbeats
//! are liveness-only (mode + uptime, never resource data); resource data
//! travels exclusively on the metrics channel. Reporting failures are the
//! caller's to log and swallow — they must never break the data path.

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Timeout for control-plane calls.
const STATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from control-plane reporting
#[derive(Error, Debug)]
pub enum StationError {
    #[error("station transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("station returned {0}")]
    Status(u16),
}

/// Liveness-only heartbeat body
#[derive(Debug, Serialize)]
pub struct HeartbeatBody<'a> {
    pub mode: &'a str,
    pub uptime_seconds: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<&'a str>,
}

/// Resource-bearing metrics body
#[derive(Debug, Serialize)]
pub struct MetricsBody {
    pub cpu_percent: f64,
    pub memory_mb: u64,
    pub requests_handled: u64,
    pub custom_metrics: serde_json::Value,
}

/// Lifecycle state-change event body
#[derive(Debug, Serialize)]
pub struct LifecycleEventBody<'a> {
    pub event_type: &'static str,
    pub from_state: &'a str,
    pub to_state: &'a str,
    pub reason: &'a str,
    pub timestamp: String,
}

/// Client for the Station's agent endpoints
pub struct StationClient {
    http: reqwest::Client,
    station_url: String,
    collector_url: Option<String>,
    agent_id: String,
    agent_key: Option<String>,
    agent_name: Option<String>,
}

impl StationClient {
    pub fn new(
        station_url: impl Into<String>,
        agent_id: impl Into<String>,
    ) -> Result<Self, StationError> {
        let http = reqwest::Client::builder()
            .timeout(STATION_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            station_url: station_url.into().trim_end_matches('/').to_string(),
            collector_url: None,
            agent_id: agent_id.into(),
            agent_key: None,
            agent_name: None,
        })
    }

    /// Route heartbeats through a dedicated collector, falling back to the
    /// Station itself when the collector is unreachable.
    pub fn with_collector(mut self, collector_url: impl Into<String>) -> Self {
        self.collector_url = Some(collector_url.into().trim_end_matches('/').to_string());
        self
    }

    pub fn with_agent_key(mut self, agent_key: impl Into<String>) -> Self {
        self.agent_key = Some(agent_key.into());
        self
    }

    pub fn with_agent_name(mut self, agent_name: impl Into<String>) -> Self {
        self.agent_name = Some(agent_name.into());
        self
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    async fn post<T: Serialize + ?Sized>(&self, url: String, body: &T) -> Result<(), StationError> {
        let mut request = self.http.post(url).json(body);
        if let Some(key) = &self.agent_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(StationError::Status(response.status().as_u16()));
        }
        Ok(())
    }

    /// Report a lifecycle state change.
    pub async fn post_lifecycle_event(
        &self,
        from_state: &str,
        to_state: &str,
        reason: &str,
    ) -> Result<(), StationError> {
        let body = LifecycleEventBody {
            event_type: "STATE_CHANGE",
            from_state,
            to_state,
            reason,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        self.post(
            format!("{}/api/agents/{}/lifecycle", self.station_url, self.agent_id),
            &body,
        )
        .await
    }

    /// Send a liveness heartbeat: collector first, Station as fallback.
    pub async fn post_heartbeat(&self, mode: &str, uptime_seconds: u64) -> Result<(), StationError> {
        let body = HeartbeatBody {
            mode,
            uptime_seconds,
            agent_name: self.agent_name.as_deref(),
        };

        if let Some(collector) = &self.collector_url {
            match self
                .post(format!("{}/heartbeat/{}", collector, self.agent_id), &body)
                .await
            {
                Ok(()) => return Ok(()),
                Err(e) => {
                    debug!("collector heartbeat failed, falling back to station: {e}");
                }
            }
        }

        self.post(
            format!("{}/api/agents/{}/heartbeat", self.station_url, self.agent_id),
            &body,
        )
        .await
    }

    /// Send resource metrics on the dedicated metrics channel.
    pub async fn post_metrics(&self, body: &MetricsBody) -> Result<(), StationError> {
        self.post(
            format!("{}/api/agents/{}/metrics", self.station_url, self.agent_id),
            body,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heartbeat_body_has_no_resource_fields() {
        let body = HeartbeatBody {
            mode: "IDLE",
            uptime_seconds: 42,
            agent_name: Some("compass"),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["mode"], "IDLE");
        assert_eq!(json["uptime_seconds"], 42);
        assert!(json.get("cpu_percent").is_none());
        assert!(json.get("memory_mb").is_none());
    }

    #[test]
    fn test_heartbeat_body_omits_missing_name() {
        let body = HeartbeatBody {
            mode: "SLEEP",
            uptime_seconds: 1,
            agent_name: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("agent_name").is_none());
    }

    #[test]
    fn test_lifecycle_event_shape() {
        let body = LifecycleEventBody {
            event_type: "STATE_CHANGE",
            from_state: "NEW",
            to_state: "PROVISIONED",
            reason: "startup",
            timestamp: "2026-01-01T00:00:00Z".to_string(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["event_type"], "STATE_CHANGE");
        assert_eq!(json["from_state"], "NEW");
        assert_eq!(json["to_state"], "PROVISIONED");
    }
}
