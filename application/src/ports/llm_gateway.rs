//! Model gateway port
//!
//! Defines how the application layer talks to LLM backends. The only
//! production adapter is the Model Router client in the infrastructure
//! layer; tests substitute scripted stubs.

use async_trait::async_trait;
use compass_domain::Model;
use thiserror::Error;

/// Errors surfaced by gateway adapters
///
/// The variants mirror the failure kinds the pipeline must distinguish:
/// authentication errors are never retried and trigger operator alerting,
/// everything else degrades to a per-model failure.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("authentication rejected by the model router")]
    AuthRejected,

    #[error("model router budget exceeded")]
    BudgetExceeded,

    #[error("rate limited by the model router")]
    RateLimited { retry_after: Option<u64> },

    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("model router error: {0}")]
    Api(String),
}

impl GatewayError {
    /// Whether this is an authentication failure (operator-visible, no retry).
    pub fn is_auth(&self) -> bool {
        matches!(self, GatewayError::AuthRejected)
    }
}

/// A single non-streaming chat call
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: Model,
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ChatRequest {
    /// Build a request with the fan-out defaults (temperature 0.3, 2048 tokens).
    pub fn new(model: Model, system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            model,
            system: system.into(),
            user: user.into(),
            temperature: 0.3,
            max_tokens: 2048,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Gateway to LLM backends behind the Model Router
///
/// Implementations must be safe to call concurrently: the fan-out issues
/// one `chat` per panel model simultaneously.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Send one chat call and return the assistant's text.
    ///
    /// An empty string is a valid success at this level; the aggregator
    /// coerces empty answers to failures.
    async fn chat(&self, request: ChatRequest) -> Result<String, GatewayError>;

    /// List the models the upstream router currently offers.
    async fn available_models(&self) -> Result<Vec<Model>, GatewayError>;
}
