//! Per-model response value object

use serde::{Deserialize, Serialize};

/// Outcome of asking one model one question
///
/// Invariant: `success == false` implies `answer` is empty, and
/// `success == true` implies `answer` is non-empty. Responses that arrive
/// successful-but-empty from the transport are coerced to failures by the
/// aggregator before scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelResponse {
    /// The model that produced this response
    pub model: String,
    /// The answer text (empty on failure)
    pub answer: String,
    /// Optional reasoning the model surfaced alongside its answer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    /// Observed wall-clock latency, including retries
    pub latency_ms: u64,
    /// Whether the call produced an answer
    pub success: bool,
    /// Error message if failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ModelResponse {
    /// Creates a successful response from a model.
    pub fn success(model: impl Into<String>, answer: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            model: model.into(),
            answer: answer.into(),
            reasoning: None,
            latency_ms,
            success: true,
            error: None,
        }
    }

    /// Creates a failed response indicating the model could not answer.
    pub fn failure(model: impl Into<String>, error: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            model: model.into(),
            answer: String::new(),
            reasoning: None,
            latency_ms,
            success: false,
            error: Some(error.into()),
        }
    }

    /// Attach reasoning text to the response.
    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }

    /// Returns `true` if this response carries a usable (non-empty) answer.
    pub fn has_answer(&self) -> bool {
        self.success && !self.answer.is_empty()
    }
}
