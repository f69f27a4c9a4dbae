//! Verdict report rendering

pub mod formatter;

pub use formatter::{
    JsonLdFormatter, MarkdownFormatter, ReportFormat, ShortPostFormatter, VerdictFormatter,
};
