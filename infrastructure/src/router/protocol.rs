//! Wire types for the Model Router chat-completion API
//!
//! These DTOs mirror the router's JSON contract exactly and stay separate
//! from the domain types; the gateway adapter translates between the two.

use serde::{Deserialize, Serialize};

/// A chat message on the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// `POST /v1/chat/completions` request body
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub stream: bool,
}

/// One completion choice
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub index: u32,
    pub message: ChatMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Token accounting reported by the router
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

/// `POST /v1/chat/completions` response body
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub model: String,
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl ChatCompletionResponse {
    /// The first choice's content; empty when the router returned none.
    ///
    /// An empty string is still a transport-level success — the consensus
    /// aggregator is the single place that demotes empty answers.
    pub fn content(&self) -> &str {
        self.choices
            .first()
            .map(|c| c.message.content.as_str())
            .unwrap_or("")
    }
}

/// One entry of `GET /v1/models`
#[derive(Debug, Clone, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    #[serde(default)]
    pub owned_by: Option<String>,
}

/// `GET /v1/models` response body
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsResponse {
    pub data: Vec<ModelInfo>,
}

/// Billing / observability metadata carried in the router's response headers
#[derive(Debug, Clone, Default)]
pub struct CallMetadata {
    /// `X-Request-Cost`, USD
    pub cost_usd: Option<f64>,
    /// `X-Request-Latency-Ms` as measured by the router
    pub latency_ms: Option<u64>,
    /// `X-Model-Provider`
    pub provider: Option<String>,
    /// `X-Cache-Status: HIT`
    pub cache_hit: bool,
}

impl CallMetadata {
    pub fn from_headers(headers: &reqwest::header::HeaderMap) -> Self {
        let text = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        Self {
            cost_usd: text("X-Request-Cost").and_then(|v| v.parse().ok()),
            latency_ms: text("X-Request-Latency-Ms").and_then(|v| v.parse().ok()),
            provider: text("X-Model-Provider"),
            cache_hit: text("X-Cache-Status").as_deref() == Some("HIT"),
        }
    }
}

/// Extract a human-readable message from an error response body.
///
/// The router sends `{"error": {"message": "..."}}` for structured errors;
/// anything else is passed through raw.
pub fn error_message_from_body(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: ErrorDetail,
    }
    #[derive(Deserialize)]
    struct ErrorDetail {
        message: String,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue};

    #[test]
    fn test_response_content_first_choice() {
        let response: ChatCompletionResponse = serde_json::from_value(serde_json::json!({
            "id": "cmpl-1",
            "model": "gpt-5.2",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "Answer."}, "finish_reason": "stop"}
            ],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }))
        .unwrap();
        assert_eq!(response.content(), "Answer.");
        assert_eq!(response.usage.unwrap().total_tokens, 15);
    }

    #[test]
    fn test_response_without_choices_is_empty() {
        let response: ChatCompletionResponse = serde_json::from_value(serde_json::json!({
            "id": "cmpl-2",
            "model": "gpt-5.2",
            "choices": []
        }))
        .unwrap();
        assert_eq!(response.content(), "");
    }

    #[test]
    fn test_call_metadata_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Request-Cost", HeaderValue::from_static("0.0042"));
        headers.insert("X-Request-Latency-Ms", HeaderValue::from_static("812"));
        headers.insert("X-Model-Provider", HeaderValue::from_static("anthropic"));
        headers.insert("X-Cache-Status", HeaderValue::from_static("HIT"));

        let metadata = CallMetadata::from_headers(&headers);
        assert_eq!(metadata.cost_usd, Some(0.0042));
        assert_eq!(metadata.latency_ms, Some(812));
        assert_eq!(metadata.provider.as_deref(), Some("anthropic"));
        assert!(metadata.cache_hit);
    }

    #[test]
    fn test_call_metadata_missing_headers() {
        let metadata = CallMetadata::from_headers(&HeaderMap::new());
        assert!(metadata.cost_usd.is_none());
        assert!(!metadata.cache_hit);
    }

    #[test]
    fn test_error_message_structured() {
        let body = r#"{"error": {"message": "model overloaded"}}"#;
        assert_eq!(error_message_from_body(body), "model overloaded");
    }

    #[test]
    fn test_error_message_raw_fallback() {
        assert_eq!(error_message_from_body("bad gateway"), "bad gateway");
    }
}
