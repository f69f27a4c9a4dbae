//! Consensus result — the verdict produced by a full jury pass

use super::response::ModelResponse;
use super::verdict::{Confidence, Verdict};
use serde::{Deserialize, Serialize};

/// The response the jury singled out as least similar to the rest
///
/// Reported only when the verdict is `split`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dissenter {
    /// Model whose answer diverged
    pub model: String,
    /// The diverging answer
    pub answer: String,
}

/// Complete outcome of a jury query
///
/// Carries the verdict, the agreement score, every raw [`ModelResponse`]
/// (failures included, so callers can inspect per-model errors), the
/// representative answer, and optional reflection / session metadata
/// attached by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusResult {
    /// Three-way verdict tag
    pub verdict: Verdict,
    /// Confidence tag, uniquely determined by the verdict
    pub confidence: Confidence,
    /// Mean pairwise agreement over successful answers, rounded to two decimals
    pub agreement_score: f64,
    /// All model responses in dispatch order, including failures
    pub responses: Vec<ModelResponse>,
    /// The answer chosen to stand for the consensus; absent only when no
    /// model produced a usable answer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub representative_answer: Option<String>,
    /// Present only when the verdict is split
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dissenter: Option<Dissenter>,
    /// Whether the reflection pass replaced the representative answer
    #[serde(default)]
    pub reflection_applied: bool,
    /// Quality score reported by the reflection critic (0–100)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
    /// The aggregator's original choice, kept when reflection replaced it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_consensus_answer: Option<String>,
    /// Session this query was bound to, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Whether conversational context from session memory was injected
    #[serde(default)]
    pub memory_context_used: bool,
    /// Whether input guardrails were applied to this query
    #[serde(default)]
    pub guardrails_applied: bool,
}

impl ConsensusResult {
    /// Build a result from the aggregation core fields; metadata defaults off.
    pub fn new(
        verdict: Verdict,
        agreement_score: f64,
        responses: Vec<ModelResponse>,
        representative_answer: Option<String>,
        dissenter: Option<Dissenter>,
    ) -> Self {
        Self {
            verdict,
            confidence: verdict.confidence(),
            agreement_score,
            responses,
            representative_answer,
            dissenter,
            reflection_applied: false,
            quality_score: None,
            original_consensus_answer: None,
            session_id: None,
            memory_context_used: false,
            guardrails_applied: false,
        }
    }

    /// Returns an iterator over responses that carry a usable answer.
    pub fn successful_responses(&self) -> impl Iterator<Item = &ModelResponse> {
        self.responses.iter().filter(|r| r.has_answer())
    }

    /// Returns an iterator over failed responses.
    pub fn failed_responses(&self) -> impl Iterator<Item = &ModelResponse> {
        self.responses.iter().filter(|r| !r.success)
    }

    /// Largest observed per-model latency — the wall-clock lower bound of
    /// the parallel fan-out.
    pub fn max_latency_ms(&self) -> u64 {
        self.responses.iter().map(|r| r.latency_ms).max().unwrap_or(0)
    }
}
