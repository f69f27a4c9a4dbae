//! Memory service — the runtime around the memory entities
//!
//! Owns the session map and the long-term store. Sessions are created
//! lazily on first reference; each session ring sits behind its own lock
//! so concurrent requests against the same session serialize their reads
//! and writes, and the long-term store has a single process-wide lock.

use chrono::Utc;
use compass_domain::{
    LongTermStore, MemoryEntry, SessionMemory, SESSION_TTL_SECONDS,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Snapshot of memory occupancy for the stats endpoint
#[derive(Debug, Clone, Serialize)]
pub struct MemoryStats {
    pub active_sessions: usize,
    pub total_session_queries: usize,
    pub long_term_memory_size: usize,
}

/// Shared conversational memory across the process
///
/// All operations are in-memory and non-blocking apart from lock waits.
pub struct MemoryService {
    sessions: RwLock<HashMap<String, Arc<Mutex<SessionMemory>>>>,
    long_term: Mutex<LongTermStore>,
    ttl_seconds: u64,
}

impl MemoryService {
    pub fn new() -> Self {
        Self::with_ttl(SESSION_TTL_SECONDS)
    }

    pub fn with_ttl(ttl_seconds: u64) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            long_term: Mutex::new(LongTermStore::new()),
            ttl_seconds,
        }
    }

    /// Get or lazily create the ring for a session.
    async fn session(&self, session_id: &str) -> Arc<Mutex<SessionMemory>> {
        if let Some(session) = self.sessions.read().await.get(session_id) {
            return Arc::clone(session);
        }
        let mut sessions = self.sessions.write().await;
        Arc::clone(
            sessions
                .entry(session_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(SessionMemory::new(session_id)))),
        )
    }

    /// Conversational-context block for a session, touching its TTL clock.
    ///
    /// Returns `None` when the session has no recorded entries yet.
    pub async fn context_for(&self, session_id: &str) -> Option<String> {
        let session = self.session(session_id).await;
        let mut session = session.lock().await;
        session.touch();
        session.context_block()
    }

    /// Record a completed outcome into the session ring and consider it
    /// for the long-term store.
    pub async fn record(&self, session_id: &str, entry: MemoryEntry) {
        let session = self.session(session_id).await;
        session.lock().await.record(entry.clone());

        let admitted = self.long_term.lock().await.admit(&entry);
        debug!(
            session_id,
            admitted, score = entry.agreement_score, "recorded jury outcome"
        );
    }

    /// The session's entries in insertion order, if the session exists.
    pub async fn history(&self, session_id: &str) -> Option<Vec<MemoryEntry>> {
        let session = {
            let sessions = self.sessions.read().await;
            sessions.get(session_id).cloned()
        }?;
        let session = session.lock().await;
        Some(session.entries().cloned().collect())
    }

    /// Long-term entries lexically similar to `question`, best first.
    pub async fn find_similar(&self, question: &str, k: usize) -> Vec<(MemoryEntry, f64)> {
        self.long_term.lock().await.find_similar(question, k)
    }

    /// Occupancy snapshot.
    pub async fn stats(&self) -> MemoryStats {
        let sessions = self.sessions.read().await;
        let mut total = 0;
        for session in sessions.values() {
            total += session.lock().await.len();
        }
        MemoryStats {
            active_sessions: sessions.len(),
            total_session_queries: total,
            long_term_memory_size: self.long_term.lock().await.len(),
        }
    }

    /// Drop sessions idle longer than the TTL; returns how many were reaped.
    pub async fn reap_expired(&self) -> usize {
        let now = Utc::now();
        let expired: Vec<String> = {
            let sessions = self.sessions.read().await;
            let mut ids = Vec::new();
            for (id, session) in sessions.iter() {
                if session.lock().await.is_expired(now, self.ttl_seconds) {
                    ids.push(id.clone());
                }
            }
            ids
        };

        if expired.is_empty() {
            return 0;
        }

        let mut sessions = self.sessions.write().await;
        let mut reaped = 0;
        for id in expired {
            if sessions.remove(&id).is_some() {
                reaped += 1;
            }
        }
        debug!(reaped, "reaped expired sessions");
        reaped
    }
}

impl Default for MemoryService {
    fn default() -> Self {
        Self::new()
    }
}
