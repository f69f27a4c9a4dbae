//! Domain layer for Compass
//!
//! This crate contains the core business logic of the AI jury: similarity
//! scoring, consensus aggregation, guardrails, memory entities, prompt
//! contracts, and reflection parsing. It has no dependencies on
//! infrastructure or presentation concerns and performs no I/O.

pub mod consensus;
pub mod core;
pub mod guardrail;
pub mod memory;
pub mod prompt;
pub mod reflection;
pub mod similarity;

// Re-export commonly used types
pub use consensus::{
    aggregate, Confidence, ConsensusResult, Dissenter, ModelResponse, Verdict, SPLIT_THRESHOLD,
    UNANIMOUS_THRESHOLD,
};
pub use core::{error::DomainError, model::Model, question::Question};
pub use guardrail::{
    parse_moderation_reply, GuardrailPolicy, GuardrailViolation, InputCheck, ModerationVerdict,
    RiskLevel,
};
pub use memory::{
    LongTermStore, MemoryEntry, SessionMemory, LONG_TERM_CAPACITY, MAX_SESSION_QUERIES,
    MIN_ADMISSION_SCORE, SESSION_TTL_SECONDS,
};
pub use prompt::JuryPrompt;
pub use reflection::{
    parse_critic_reply, CriticAssessment, ReflectionParseError, ReflectionResult,
    QUALITY_THRESHOLD,
};
pub use similarity::sim;
