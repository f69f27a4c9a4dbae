//! HTTP client for the Model Router
//!
//! One upstream endpoint abstracts every LLM provider behind a unified
//! chat-completion API. The client owns authentication (bearer JWT), the
//! per-request tracking headers, status-code classification, and the
//! retry/back-off loop. Authentication failures bypass retry entirely;
//! rate limits honour `Retry-After` when present.

use super::error::{Result, RouterError};
use super::protocol::{
    error_message_from_body, CallMetadata, ChatCompletionRequest, ChatCompletionResponse,
    ModelInfo, ModelsResponse,
};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

/// Maximum retry attempts after the initial call.
const MAX_RETRIES: u32 = 2;

/// Base delay for the linear back-off (1×, 2× per attempt).
const BACKOFF_BASE: Duration = Duration::from_secs(1);

/// Default per-call timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for the Model Router's HTTP API
pub struct RouterClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    agent_id: String,
}

impl RouterClient {
    /// Build a client with the default 60 s timeout.
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        agent_id: impl Into<String>,
    ) -> Result<Self> {
        Self::with_timeout(base_url, token, agent_id, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        token: impl Into<String>,
        agent_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            agent_id: agent_id.into(),
        })
    }

    /// `POST /v1/chat/completions` with retries.
    ///
    /// Retries up to twice with 1 s × attempt back-off on retryable
    /// failures; a 429's `Retry-After` overrides the back-off delay.
    pub async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<(ChatCompletionResponse, CallMetadata)> {
        let mut attempt = 0u32;
        loop {
            match self.chat_completion_once(request).await {
                Ok(ok) => return Ok(ok),
                Err(e) if attempt < MAX_RETRIES && e.is_retryable() => {
                    let delay = match &e {
                        RouterError::RateLimited {
                            retry_after: Some(seconds),
                        } => Duration::from_secs(*seconds),
                        _ => BACKOFF_BASE * (attempt + 1),
                    };
                    warn!(
                        model = %request.model,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "router call failed, retrying: {e}"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn chat_completion_once(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<(ChatCompletionResponse, CallMetadata)> {
        let response = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.token)
            .header("X-PAP-Agent-Id", &self.agent_id)
            .header("X-PAP-Request-Id", Uuid::new_v4().to_string())
            .json(request)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status().as_u16();
        let metadata = CallMetadata::from_headers(response.headers());

        if (200..300).contains(&status) {
            debug!(
                model = %request.model,
                cached = metadata.cache_hit,
                cost_usd = metadata.cost_usd,
                "router call succeeded"
            );
            let parsed = response
                .json::<ChatCompletionResponse>()
                .await
                .map_err(|e| RouterError::Parse(e.to_string()))?;
            return Ok((parsed, metadata));
        }

        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        let body = response.text().await.unwrap_or_default();
        Err(classify_status(status, retry_after, &body))
    }

    /// `GET /v1/models` — the router's currently available backends.
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let response = self
            .http
            .get(format!("{}/v1/models", self.base_url))
            .bearer_auth(&self.token)
            .header("X-PAP-Agent-Id", &self.agent_id)
            .header("X-PAP-Request-Id", Uuid::new_v4().to_string())
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status().as_u16();
        if (200..300).contains(&status) {
            let parsed = response
                .json::<ModelsResponse>()
                .await
                .map_err(|e| RouterError::Parse(e.to_string()))?;
            return Ok(parsed.data);
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_status(status, None, &body))
    }
}

fn classify_transport(error: reqwest::Error) -> RouterError {
    if error.is_timeout() {
        RouterError::Timeout
    } else {
        RouterError::Transport(error)
    }
}

/// Map a non-2xx status to its distinct error kind.
fn classify_status(status: u16, retry_after: Option<u64>, body: &str) -> RouterError {
    match status {
        401 => RouterError::Auth,
        402 => RouterError::BudgetExceeded,
        429 => RouterError::RateLimited { retry_after },
        _ => RouterError::Api {
            status,
            message: error_message_from_body(body),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_auth_is_terminal() {
        let error = classify_status(401, None, "");
        assert!(error.is_auth());
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_classify_budget() {
        assert!(matches!(
            classify_status(402, None, ""),
            RouterError::BudgetExceeded
        ));
    }

    #[test]
    fn test_classify_rate_limit_carries_retry_after() {
        match classify_status(429, Some(7), "") {
            RouterError::RateLimited { retry_after } => assert_eq!(retry_after, Some(7)),
            other => panic!("unexpected: {other}"),
        }
    }

    #[test]
    fn test_classify_other_uses_error_body() {
        match classify_status(503, None, r#"{"error": {"message": "overloaded"}}"#) {
            RouterError::Api { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "overloaded");
            }
            other => panic!("unexpected: {other}"),
        }
    }

    #[test]
    fn test_classify_other_raw_body() {
        match classify_status(500, None, "stack trace here") {
            RouterError::Api { message, .. } => assert_eq!(message, "stack trace here"),
            other => panic!("unexpected: {other}"),
        }
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = RouterClient::new("http://router.local/", "jwt", "agent-1").unwrap();
        assert_eq!(client.base_url, "http://router.local");
    }
}
