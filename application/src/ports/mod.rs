//! Ports — interfaces the application layer consumes
//!
//! Adapters live in the infrastructure layer.

pub mod llm_gateway;
pub mod metrics;
pub mod query_log;

pub use llm_gateway::{ChatRequest, GatewayError, ModelGateway};
pub use metrics::{MetricsSink, NoMetrics};
pub use query_log::{NoQueryLog, QueryEvent, QueryLogger};
