//! Reflection pass types and critic-output parsing
//!
//! The critic model is instructed to reply with pure JSON, but in practice
//! replies arrive both bare and wrapped in ``` fences. Parsing tolerates
//! both; any failure becomes a [`ReflectionResult::failed`] value and the
//! representative answer is left untouched.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum critic quality score at which the refined answer replaces the
/// aggregator's choice.
pub const QUALITY_THRESHOLD: f64 = 70.0;

/// The critic model's structured assessment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticAssessment {
    /// Quality of the representative answer, 0–100
    pub quality_score: f64,
    /// Issues the critic found
    #[serde(default)]
    pub issues: Vec<String>,
    /// The critic's improved answer
    pub refined_answer: String,
}

/// Why a critic reply could not be used
#[derive(Debug, Clone, Error)]
pub enum ReflectionParseError {
    #[error("critic reply is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("critic quality score {0} is outside 0–100")]
    ScoreOutOfRange(f64),
}

/// Outcome of the reflection pass as recorded on the pipeline result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReflectionResult {
    /// Critic quality score (0 when the pass failed)
    pub quality_score: f64,
    /// Issues found, or the failure description
    pub issues: Vec<String>,
    /// Refined answer, absent when the pass failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refined_answer: Option<String>,
}

impl ReflectionResult {
    /// Result for a failed reflection pass; never replaces the answer.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            quality_score: 0.0,
            issues: vec![format!("reflection failed: {}", reason.into())],
            refined_answer: None,
        }
    }

    /// Whether the quality bound permits replacing the representative.
    pub fn meets_threshold(&self) -> bool {
        self.quality_score >= QUALITY_THRESHOLD && self.refined_answer.is_some()
    }
}

impl From<CriticAssessment> for ReflectionResult {
    fn from(assessment: CriticAssessment) -> Self {
        Self {
            quality_score: assessment.quality_score,
            issues: assessment.issues,
            refined_answer: Some(assessment.refined_answer),
        }
    }
}

/// Strip a surrounding ``` / ```json fence from a reply, if present.
///
/// Returns the trimmed inner body; replies without fences pass through
/// trimmed.
pub fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json", "JSON", …) up to the first newline.
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end_matches('`').trim()
}

/// Parse the critic model's reply into an assessment.
pub fn parse_critic_reply(raw: &str) -> Result<CriticAssessment, ReflectionParseError> {
    let body = strip_fences(raw);
    let assessment: CriticAssessment = serde_json::from_str(body)
        .map_err(|e| ReflectionParseError::InvalidJson(e.to_string()))?;
    if !(0.0..=100.0).contains(&assessment.quality_score) {
        return Err(ReflectionParseError::ScoreOutOfRange(assessment.quality_score));
    }
    Ok(assessment)
}
