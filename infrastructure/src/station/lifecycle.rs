//! Agent lifecycle state machine
//!
//! `NEW → PROVISIONED → ACTIVE ↔ DRAINING → TERMINATED`, with
//! `ACTIVE → KILLED` as the error path. Every transition is validated and
//! reported to the Station; reporting failures are logged and swallowed.

use super::client::StationClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Agent lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleState {
    New,
    Provisioned,
    Active,
    Draining,
    Terminated,
    Killed,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::New => "NEW",
            LifecycleState::Provisioned => "PROVISIONED",
            LifecycleState::Active => "ACTIVE",
            LifecycleState::Draining => "DRAINING",
            LifecycleState::Terminated => "TERMINATED",
            LifecycleState::Killed => "KILLED",
        }
    }

    /// Whether this state serves jury queries.
    pub fn is_serving(&self) -> bool {
        matches!(self, LifecycleState::Active)
    }

    /// Whether the health probe may report healthy in this state.
    pub fn is_health_reportable(&self) -> bool {
        matches!(
            self,
            LifecycleState::New
                | LifecycleState::Provisioned
                | LifecycleState::Active
                | LifecycleState::Draining
        )
    }

    /// Whether `self → to` is a legal transition.
    pub fn can_transition(&self, to: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, to),
            (New, Provisioned)
                | (Provisioned, Active)
                | (Active, Draining)
                | (Draining, Active)
                | (Draining, Terminated)
                | (Active, Killed)
        )
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rejected lifecycle transition
#[derive(Error, Debug)]
#[error("invalid lifecycle transition {from} -> {to}")]
pub struct InvalidTransition {
    pub from: LifecycleState,
    pub to: LifecycleState,
}

/// Holds the current state and reports transitions to the Station
pub struct LifecycleManager {
    state: RwLock<LifecycleState>,
    station: Arc<StationClient>,
}

impl LifecycleManager {
    /// New manager starting in `NEW`.
    pub fn new(station: Arc<StationClient>) -> Self {
        Self {
            state: RwLock::new(LifecycleState::New),
            station,
        }
    }

    pub async fn current(&self) -> LifecycleState {
        *self.state.read().await
    }

    /// Validate and apply a transition, then report it.
    ///
    /// The state change is applied even when the Station cannot be
    /// reached; control-plane failures never gate the agent itself.
    pub async fn transition(
        &self,
        to: LifecycleState,
        reason: &str,
    ) -> Result<(), InvalidTransition> {
        let from = {
            let mut state = self.state.write().await;
            let from = *state;
            if !from.can_transition(to) {
                return Err(InvalidTransition { from, to });
            }
            *state = to;
            from
        };

        info!(%from, %to, reason, "lifecycle transition");
        if let Err(e) = self
            .station
            .post_lifecycle_event(from.as_str(), to.as_str(), reason)
            .await
        {
            warn!("failed to report lifecycle transition: {e}");
        }
        Ok(())
    }
}
