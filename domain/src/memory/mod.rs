//! Memory entities: per-session rings and the long-term store
//!
//! These are the pure data structures; locking, TTL reaping, and the
//! session map live in the application layer's memory service.

pub mod entry;
pub mod long_term;
pub mod session;

pub use entry::MemoryEntry;
pub use long_term::{LongTermStore, LONG_TERM_CAPACITY, MIN_ADMISSION_SCORE};
pub use session::{SessionMemory, MAX_SESSION_QUERIES, SESSION_TTL_SECONDS};
