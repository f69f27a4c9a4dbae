//! Memory entry — one recorded question/answer outcome

use crate::consensus::Verdict;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single recorded question/answer pair (immutable once written)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryEntry {
    /// Unique entry id
    pub id: String,
    /// The question as asked
    pub question: String,
    /// The representative answer the jury settled on
    pub answer: String,
    /// Verdict the jury reached
    pub verdict: Verdict,
    /// Agreement score at the time of recording
    pub agreement_score: f64,
    /// When the outcome was recorded
    pub timestamp: DateTime<Utc>,
}

impl MemoryEntry {
    /// Record a new outcome with a fresh id and the current time.
    pub fn new(
        question: impl Into<String>,
        answer: impl Into<String>,
        verdict: Verdict,
        agreement_score: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            question: question.into(),
            answer: answer.into(),
            verdict,
            agreement_score,
            timestamp: Utc::now(),
        }
    }

    /// The question case-folded and trimmed, used for duplicate detection.
    pub fn normalized_question(&self) -> String {
        self.question.trim().to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_get_unique_ids() {
        let a = MemoryEntry::new("q", "a", Verdict::Unanimous, 0.95);
        let b = MemoryEntry::new("q", "a", Verdict::Unanimous, 0.95);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_normalized_question() {
        let entry = MemoryEntry::new("  What Is 2+2?  ", "4", Verdict::Unanimous, 0.95);
        assert_eq!(entry.normalized_question(), "what is 2+2?");
    }
}
