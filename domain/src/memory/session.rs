//! Per-session conversational memory ring

use super::entry::MemoryEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Maximum entries retained per session; the oldest is evicted on overflow.
pub const MAX_SESSION_QUERIES: usize = 10;

/// How many recent entries feed the conversational-context block.
const CONTEXT_ENTRIES: usize = 3;

/// Default session time-to-live in seconds.
pub const SESSION_TTL_SECONDS: u64 = 3600;

/// A bounded, insertion-ordered ring of recent outcomes for one session
///
/// Created lazily on first reference and reaped once idle for longer than
/// the session TTL.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMemory {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
    entries: VecDeque<MemoryEntry>,
}

impl SessionMemory {
    /// Create an empty session ring.
    pub fn new(session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            created_at: now,
            last_accessed_at: now,
            entries: VecDeque::new(),
        }
    }

    /// Append an outcome, evicting the oldest entry past capacity.
    pub fn record(&mut self, entry: MemoryEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > MAX_SESSION_QUERIES {
            self.entries.pop_front();
        }
        self.touch();
    }

    /// Mark the session as accessed now.
    pub fn touch(&mut self) {
        self.last_accessed_at = Utc::now();
    }

    /// Whether the session has been idle longer than `ttl_seconds`.
    pub fn is_expired(&self, now: DateTime<Utc>, ttl_seconds: u64) -> bool {
        (now - self.last_accessed_at).num_seconds() > ttl_seconds as i64
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = &MemoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build the conversational-context block from the most recent entries.
    ///
    /// Returns `None` for an empty session. The block format is consumed
    /// verbatim by the fan-out's user-message composition:
    ///
    /// ```text
    /// Previous conversation context:
    /// Q: <question>
    /// A: <answer>
    ///
    /// Q: <question>
    /// A: <answer>
    /// ```
    pub fn context_block(&self) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }
        let start = self.entries.len().saturating_sub(CONTEXT_ENTRIES);
        let body = self
            .entries
            .iter()
            .skip(start)
            .map(|e| format!("Q: {}\nA: {}", e.question, e.answer))
            .collect::<Vec<_>>()
            .join("\n\n");
        Some(format!("Previous conversation context:\n{body}"))
    }
}
