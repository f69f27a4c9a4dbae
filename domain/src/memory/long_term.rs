//! Process-wide long-term store of high-quality outcomes

use super::entry::MemoryEntry;
use crate::consensus::Verdict;
use crate::similarity::tokenize;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Capacity of the long-term store across all sessions.
pub const LONG_TERM_CAPACITY: usize = 1000;

/// Minimum agreement score for admission to the long-term store.
pub const MIN_ADMISSION_SCORE: f64 = 0.80;

/// Minimum keyword length for similar-query lookup.
const MIN_KEYWORD_LEN: usize = 4;

/// A bounded FIFO of high-quality outcomes shared across sessions
///
/// Admission requires an agreement score of at least
/// [`MIN_ADMISSION_SCORE`], a verdict other than no-consensus, and a
/// question not already present (case-folded, trimmed). Eviction is
/// first-in-first-out by insertion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LongTermStore {
    capacity: usize,
    entries: VecDeque<MemoryEntry>,
}

impl LongTermStore {
    /// Store with the standard capacity.
    pub fn new() -> Self {
        Self::with_capacity(LONG_TERM_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consider an entry for admission; returns whether it was stored.
    pub fn admit(&mut self, entry: &MemoryEntry) -> bool {
        if entry.agreement_score < MIN_ADMISSION_SCORE {
            return false;
        }
        if entry.verdict == Verdict::NoConsensus {
            return false;
        }
        let normalized = entry.normalized_question();
        if self
            .entries
            .iter()
            .any(|e| e.normalized_question() == normalized)
        {
            return false;
        }

        self.entries.push_back(entry.clone());
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        true
    }

    /// Find stored entries lexically similar to `question`.
    ///
    /// Keywords are case-folded tokens longer than three characters; each
    /// entry scores the fraction of keywords appearing as substrings of
    /// its case-folded question. Zero-score entries are dropped and the
    /// top `k` are returned by descending score (ties keep insertion
    /// order).
    pub fn find_similar(&self, question: &str, k: usize) -> Vec<(MemoryEntry, f64)> {
        let keywords: Vec<String> = tokenize(question)
            .into_iter()
            .filter(|t| t.len() >= MIN_KEYWORD_LEN)
            .collect();
        if keywords.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(MemoryEntry, f64)> = self
            .entries
            .iter()
            .filter_map(|entry| {
                let haystack = entry.normalized_question();
                let hits = keywords.iter().filter(|kw| haystack.contains(kw.as_str())).count();
                if hits == 0 {
                    return None;
                }
                Some((entry.clone(), hits as f64 / keywords.len() as f64))
            })
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        scored
    }
}

impl Default for LongTermStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(question: &str, verdict: Verdict, score: f64) -> MemoryEntry {
        MemoryEntry::new(question, "some answer", verdict, score)
    }

    #[test]
    fn test_admits_high_quality_entry() {
        let mut store = LongTermStore::new();
        assert!(store.admit(&entry("What is Rust?", Verdict::Unanimous, 0.95)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_rejects_low_score() {
        let mut store = LongTermStore::new();
        assert!(!store.admit(&entry("q", Verdict::Split, 0.79)));
        // Boundary: exactly 0.80 is admitted.
        assert!(store.admit(&entry("q", Verdict::Split, 0.80)));
    }

    #[test]
    fn test_rejects_no_consensus() {
        let mut store = LongTermStore::new();
        assert!(!store.admit(&entry("q", Verdict::NoConsensus, 0.95)));
    }

    #[test]
    fn test_rejects_case_folded_duplicate() {
        let mut store = LongTermStore::new();
        assert!(store.admit(&entry("What is Rust?", Verdict::Unanimous, 0.95)));
        assert!(!store.admit(&entry("  WHAT IS RUST?  ", Verdict::Unanimous, 0.99)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_fifo_eviction_at_capacity() {
        let mut store = LongTermStore::with_capacity(3);
        for i in 0..5 {
            assert!(store.admit(&entry(&format!("question number {i}"), Verdict::Unanimous, 0.9)));
        }
        assert_eq!(store.len(), 3);
        let similar = store.find_similar("question number", 10);
        assert!(similar.iter().all(|(e, _)| !e.question.ends_with('0')));
    }

    #[test]
    fn test_find_similar_scores_by_keyword_fraction() {
        let mut store = LongTermStore::new();
        store.admit(&entry("How does Rust handle memory safety?", Verdict::Unanimous, 0.9));
        store.admit(&entry("Best pizza toppings ranked", Verdict::Unanimous, 0.9));

        let results = store.find_similar("rust memory model", 5);
        assert_eq!(results.len(), 1);
        assert!(results[0].0.question.contains("Rust"));
        // Two of three keywords ("rust", "memory") match.
        assert!((results[0].1 - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_find_similar_drops_zero_scores_and_limits() {
        let mut store = LongTermStore::new();
        for i in 0..4 {
            store.admit(&entry(&format!("kubernetes cluster sizing {i}"), Verdict::Unanimous, 0.9));
        }
        store.admit(&entry("gardening tips", Verdict::Unanimous, 0.9));

        let results = store.find_similar("kubernetes cluster", 2);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|(_, s)| *s > 0.0));
    }

    #[test]
    fn test_short_tokens_are_not_keywords() {
        let mut store = LongTermStore::new();
        store.admit(&entry("a an is to be or", Verdict::Unanimous, 0.9));
        assert!(store.find_similar("is it to be", 5).is_empty());
    }
}
