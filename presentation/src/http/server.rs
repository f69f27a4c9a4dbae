//! Façade router and shared application state

use super::handlers;
use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use compass_application::{MemoryService, ModelGateway, RunJuryUseCase};
use compass_domain::Model;
use compass_infrastructure::{Heartbeater, LifecycleManager, MetricsCollector};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};

/// Shared state behind every façade handler
#[derive(Clone)]
pub struct AppState {
    pub jury: Arc<RunJuryUseCase>,
    pub memory: Arc<MemoryService>,
    pub metrics: Arc<MetricsCollector>,
    pub lifecycle: Arc<LifecycleManager>,
    pub heartbeat: Arc<Heartbeater>,
    pub gateway: Arc<dyn ModelGateway>,
    pub configured_models: Vec<Model>,
    pub started_at: Instant,
}

impl AppState {
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

/// Build the complete façade application
///
/// All routes share one state; CORS is open since the façade does not
/// authenticate end users.
pub fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route("/query", post(handlers::query))
        .route("/api/chat", post(handlers::chat))
        .route("/health", get(handlers::health))
        .route("/status", get(handlers::status))
        .route("/metrics", get(handlers::metrics))
        .route("/api/chat/history/:session_id", get(handlers::chat_history))
        .route("/api/memory/stats", get(handlers::memory_stats))
        .layer(cors)
        .with_state(state)
}
