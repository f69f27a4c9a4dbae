//! Verdict and confidence classification
//!
//! The three-way verdict is a pure function of the agreement score; the
//! confidence tag is a pure function of the verdict. Both threshold
//! boundaries are inclusive on the lower side.

use serde::{Deserialize, Serialize};

/// Agreement score at or above which the jury is unanimous.
pub const UNANIMOUS_THRESHOLD: f64 = 0.90;

/// Agreement score at or above which the jury is split (below unanimous).
pub const SPLIT_THRESHOLD: f64 = 0.60;

/// Categorical summary of inter-model agreement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// All answers substantially agree (score ≥ 0.90)
    Unanimous,
    /// A majority agrees but at least one answer diverges (0.60 ≤ score < 0.90)
    Split,
    /// No meaningful agreement (score < 0.60)
    NoConsensus,
}

impl Verdict {
    /// Classify an agreement score.
    pub fn from_score(score: f64) -> Self {
        if score >= UNANIMOUS_THRESHOLD {
            Verdict::Unanimous
        } else if score >= SPLIT_THRESHOLD {
            Verdict::Split
        } else {
            Verdict::NoConsensus
        }
    }

    /// The confidence tag this verdict determines.
    pub fn confidence(&self) -> Confidence {
        match self {
            Verdict::Unanimous => Confidence::High,
            Verdict::Split => Confidence::Medium,
            Verdict::NoConsensus => Confidence::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Unanimous => "unanimous",
            Verdict::Split => "split",
            Verdict::NoConsensus => "no_consensus",
        }
    }

    /// Check if the verdict is unanimous
    pub fn is_unanimous(&self) -> bool {
        matches!(self, Verdict::Unanimous)
    }

    /// Check if the verdict is split
    pub fn is_split(&self) -> bool {
        matches!(self, Verdict::Split)
    }

    /// Check if the jury failed to reach consensus
    pub fn is_no_consensus(&self) -> bool {
        matches!(self, Verdict::NoConsensus)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Confidence tag, uniquely determined by the verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
