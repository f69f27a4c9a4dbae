//! Gateway adapter over the Model Router client
//!
//! Implements the application's `ModelGateway` port: translates domain
//! requests into wire DTOs, maps router errors onto the port's error
//! kinds, and folds billing metadata into the metrics collector.

use super::client::RouterClient;
use super::error::RouterError;
use super::protocol::{ChatCompletionRequest, ChatMessage};
use crate::metrics::MetricsCollector;
use async_trait::async_trait;
use compass_application::{ChatRequest, GatewayError, ModelGateway};
use compass_domain::Model;
use std::sync::Arc;

/// The production `ModelGateway`: every chat call goes to the one router.
pub struct RouterGateway {
    client: Arc<RouterClient>,
    collector: Option<Arc<MetricsCollector>>,
}

impl RouterGateway {
    pub fn new(client: Arc<RouterClient>) -> Self {
        Self {
            client,
            collector: None,
        }
    }

    /// Attach a collector to accumulate per-call cost and cache metadata.
    pub fn with_collector(mut self, collector: Arc<MetricsCollector>) -> Self {
        self.collector = Some(collector);
        self
    }
}

#[async_trait]
impl ModelGateway for RouterGateway {
    async fn chat(&self, request: ChatRequest) -> Result<String, GatewayError> {
        let wire = ChatCompletionRequest {
            model: request.model.to_string(),
            messages: vec![
                ChatMessage::system(&request.system),
                ChatMessage::user(&request.user),
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: false,
        };

        let (response, metadata) = self
            .client
            .chat_completion(&wire)
            .await
            .map_err(map_router_error)?;

        if let Some(collector) = &self.collector {
            collector.record_router_call(&metadata);
        }

        Ok(response.content().to_string())
    }

    async fn available_models(&self) -> Result<Vec<Model>, GatewayError> {
        let models = self
            .client
            .list_models()
            .await
            .map_err(map_router_error)?;
        Ok(models
            .into_iter()
            .map(|m| m.id.parse().unwrap())
            .collect())
    }
}

fn map_router_error(error: RouterError) -> GatewayError {
    match error {
        RouterError::Auth => GatewayError::AuthRejected,
        RouterError::BudgetExceeded => GatewayError::BudgetExceeded,
        RouterError::RateLimited { retry_after } => GatewayError::RateLimited { retry_after },
        RouterError::Timeout => GatewayError::Timeout,
        RouterError::Api { status, message } => {
            GatewayError::Api(format!("{status}: {message}"))
        }
        RouterError::Transport(e) => GatewayError::Transport(e.to_string()),
        RouterError::Parse(e) => GatewayError::Transport(e),
    }
}
