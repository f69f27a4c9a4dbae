//! Verdict report formatters
//!
//! Three presentations of a [`ConsensusResult`]: a Markdown report, a
//! short-post rendering capped at 280 characters, and a JSON-LD document
//! using the schema.org Question/Answer vocabulary.

use compass_domain::{ConsensusResult, DomainError, Verdict};

/// The report presentation requested by a client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Json,
    Twitter,
    Markdown,
}

impl std::str::FromStr for ReportFormat {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(ReportFormat::Json),
            "twitter" => Ok(ReportFormat::Twitter),
            "markdown" => Ok(ReportFormat::Markdown),
            other => Err(DomainError::InvalidFormat(other.to_string())),
        }
    }
}

/// Trait for formatting verdict reports
pub trait VerdictFormatter {
    /// Render the complete result.
    fn format(&self, result: &ConsensusResult) -> String;
}

/// Markdown report: verdict header, representative answer, panel detail
pub struct MarkdownFormatter;

impl VerdictFormatter for MarkdownFormatter {
    fn format(&self, result: &ConsensusResult) -> String {
        let mut out = String::new();

        out.push_str(&format!(
            "## AI Jury Verdict: {}\n\n**Confidence:** {} · **Agreement:** {:.2}\n\n",
            verdict_label(result.verdict),
            result.confidence,
            result.agreement_score
        ));

        match &result.representative_answer {
            Some(answer) => {
                out.push_str("### Consensus Answer\n\n");
                out.push_str(answer);
                out.push_str("\n\n");
            }
            None => out.push_str("_No model produced a usable answer._\n\n"),
        }

        if result.reflection_applied {
            out.push_str("_Refined by the reflection pass");
            if let Some(quality) = result.quality_score {
                out.push_str(&format!(" (quality {quality:.0}/100)"));
            }
            out.push_str("._\n\n");
        }

        if let Some(dissenter) = &result.dissenter {
            out.push_str(&format!(
                "### Dissenting Opinion ({})\n\n{}\n\n",
                dissenter.model, dissenter.answer
            ));
        }

        out.push_str("### Panel\n\n");
        for response in &result.responses {
            if response.success {
                out.push_str(&format!("- **{}** ({} ms)\n", response.model, response.latency_ms));
            } else {
                out.push_str(&format!(
                    "- **{}** — failed: {}\n",
                    response.model,
                    response.error.as_deref().unwrap_or("unknown error")
                ));
            }
        }

        out
    }
}

/// Short-post rendering, capped at 280 characters
pub struct ShortPostFormatter;

/// Hard cap for the short-post presentation.
const SHORT_POST_LIMIT: usize = 280;

impl VerdictFormatter for ShortPostFormatter {
    fn format(&self, result: &ConsensusResult) -> String {
        let header = format!(
            "{} AI Jury: {} ({:.2})\n",
            verdict_emoji(result.verdict),
            verdict_label(result.verdict),
            result.agreement_score
        );

        let answer = result
            .representative_answer
            .as_deref()
            .unwrap_or("No usable answer from the panel.");

        let budget = SHORT_POST_LIMIT.saturating_sub(header.chars().count());
        let mut body: String = answer.chars().take(budget).collect();
        if answer.chars().count() > budget && budget >= 1 {
            body.pop();
            body.push('…');
        }

        format!("{header}{body}")
    }
}

/// JSON-LD document using schema.org Question/Answer
pub struct JsonLdFormatter;

impl JsonLdFormatter {
    /// The structured document; the trait renders it as a string.
    pub fn format_value(&self, question: &str, result: &ConsensusResult) -> serde_json::Value {
        serde_json::json!({
            "@context": "https://schema.org",
            "@type": "Question",
            "name": question,
            "answerCount": result.successful_responses().count(),
            "suggestedAnswer": result.representative_answer.as_ref().map(|answer| {
                serde_json::json!({
                    "@type": "Answer",
                    "text": answer,
                })
            }),
            "compass:verdict": result.verdict.as_str(),
            "compass:confidence": result.confidence.as_str(),
            "compass:agreementScore": result.agreement_score,
            "compass:result": result,
        })
    }
}

fn verdict_label(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Unanimous => "Unanimous",
        Verdict::Split => "Split",
        Verdict::NoConsensus => "No Consensus",
    }
}

fn verdict_emoji(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Unanimous => "✅",
        Verdict::Split => "⚖️",
        Verdict::NoConsensus => "❓",
    }
}
