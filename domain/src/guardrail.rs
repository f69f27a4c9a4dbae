//! Input guardrails — prompt-injection and content screening
//!
//! Input validation runs synchronously before any model call: empty input
//! and oversized input are rejected outright, known prompt-injection
//! phrasings block the query at high risk, and sensitive-topic keywords
//! produce warnings without blocking. Output moderation is a separate,
//! optional post-aggregation step whose reply is parsed here; it fails
//! open.

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum accepted input length, in characters.
pub const MAX_INPUT_CHARS: usize = 10_000;

/// Risk classification attached to guardrail outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A blocked input, carrying the reason and its risk level
#[derive(Debug, Clone, Error)]
#[error("{reason}")]
pub struct GuardrailViolation {
    pub reason: String,
    pub risk: RiskLevel,
}

/// Outcome of input validation: allowed (possibly with warnings) or blocked
#[derive(Debug, Clone)]
pub enum InputCheck {
    Allowed { warnings: Vec<String> },
    Blocked(GuardrailViolation),
}

impl InputCheck {
    pub fn is_blocked(&self) -> bool {
        matches!(self, InputCheck::Blocked(_))
    }
}

/// Compiled guardrail rule set
///
/// Patterns are fixed at construction; matching is case-insensitive.
pub struct GuardrailPolicy {
    injection: Vec<Regex>,
    sensitive: Vec<(Regex, &'static str)>,
}

/// Prompt-injection phrasings that block a query outright.
const INJECTION_PATTERNS: &[&str] = &[
    r"ignore\s+previous\s+instructions",
    r"disregard\s+your\s+instructions",
    r"forget\s+your\s+instructions",
    r"you\s+are\s+now",
    r"pretend\s+you\s+are",
    r"act\s+as\s+if\s+you",
    r"jailbreak",
    r"dan\s+mode",
    r"bypass\s+safety",
    r"override\s+instructions",
    r"ignore\s+safety",
    r"system\s+prompt",
    r"reveal\s+your\s+(instructions|prompt|system)",
];

/// Sensitive topics that warn but do not block.
const SENSITIVE_PATTERNS: &[(&str, &str)] = &[
    (r"illegal\s+activit", "illegal activities"),
    (r"weapons?\s+manufactur", "weapons manufacturing"),
    (r"explosives?", "explosives"),
    (r"medical\s+diagnosis", "personal medical diagnosis"),
    (r"legal\s+advice\s+for\s+crimes?", "legal advice for crimes"),
    (r"self[\s-]?harm", "self-harm"),
    (r"suicide", "suicide"),
];

impl GuardrailPolicy {
    /// Compile the fixed rule set.
    pub fn new() -> Self {
        let compile = |p: &str| {
            Regex::new(&format!("(?i){p}")).expect("guardrail pattern must compile")
        };
        Self {
            injection: INJECTION_PATTERNS.iter().map(|p| compile(p)).collect(),
            sensitive: SENSITIVE_PATTERNS
                .iter()
                .map(|(p, label)| (compile(p), *label))
                .collect(),
        }
    }

    /// Validate a raw user question before it reaches any model.
    pub fn check_input(&self, input: &str) -> InputCheck {
        if input.trim().is_empty() {
            return InputCheck::Blocked(GuardrailViolation {
                reason: "input is empty".to_string(),
                risk: RiskLevel::Low,
            });
        }

        if input.chars().count() > MAX_INPUT_CHARS {
            return InputCheck::Blocked(GuardrailViolation {
                reason: format!("input exceeds {MAX_INPUT_CHARS} characters"),
                risk: RiskLevel::Medium,
            });
        }

        if let Some(pattern) = self.injection.iter().find(|re| re.is_match(input)) {
            return InputCheck::Blocked(GuardrailViolation {
                reason: format!("input matches blocked pattern: {}", pattern.as_str()),
                risk: RiskLevel::High,
            });
        }

        let warnings = self
            .sensitive
            .iter()
            .filter(|(re, _)| re.is_match(input))
            .map(|(_, label)| format!("sensitive topic: {label}"))
            .collect();

        InputCheck::Allowed { warnings }
    }
}

impl Default for GuardrailPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Verdict returned by the output-moderation model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationVerdict {
    pub safe: bool,
    #[serde(default)]
    pub concerns: Vec<String>,
}

impl ModerationVerdict {
    /// The fail-open verdict used when moderation cannot be evaluated.
    pub fn fail_open(reason: impl Into<String>) -> Self {
        Self {
            safe: true,
            concerns: vec![format!("moderation unavailable: {}", reason.into())],
        }
    }
}

/// Parse the moderation model's reply, tolerating ``` fences.
///
/// Any parse failure falls back to [`ModerationVerdict::fail_open`].
pub fn parse_moderation_reply(raw: &str) -> ModerationVerdict {
    let body = crate::reflection::strip_fences(raw);
    match serde_json::from_str::<ModerationVerdict>(body) {
        Ok(verdict) => verdict,
        Err(e) => ModerationVerdict::fail_open(e.to_string()),
    }
}
