//! Infrastructure layer for Compass
//!
//! Adapters over the outside world: the Model Router HTTP client, the
//! Station control-plane telemetry, the metrics collector, environment
//! configuration, and the JSONL query log.

pub mod config;
pub mod metrics;
pub mod query_log;
pub mod router;
pub mod station;

// Re-export commonly used types
pub use config::CompassConfig;
pub use metrics::{MetricsCollector, MetricsSnapshot};
pub use query_log::JsonlQueryLog;
pub use router::{CallMetadata, RouterClient, RouterError, RouterGateway};
pub use station::{
    HeartbeatMode, Heartbeater, InvalidTransition, LifecycleManager, LifecycleState,
    MetricsReporter, StationClient, StationError,
};
