//! Consensus scoring — responses in, verdict out
//!
//! This module owns the numeric agreement procedure: the pairwise
//! similarity matrix, the three-way verdict thresholds, representative
//! selection, and dissenter identification.

pub mod aggregator;
pub mod response;
pub mod result;
pub mod verdict;

pub use aggregator::aggregate;
pub use response::ModelResponse;
pub use result::{ConsensusResult, Dissenter};
pub use verdict::{Confidence, Verdict, SPLIT_THRESHOLD, UNANIMOUS_THRESHOLD};
