//! Presentation layer for Compass
//!
//! The HTTP façade (axum router, handlers, error envelope) and the verdict
//! report formatters.

pub mod http;
pub mod output;

// Re-export commonly used types
pub use http::{build_app, ApiError, AppState};
pub use output::{
    JsonLdFormatter, MarkdownFormatter, ReportFormat, ShortPostFormatter, VerdictFormatter,
};
