//! Prompt contracts for the jury flow
//!
//! The jury system prompt and the critic prompt are fixed strings — they
//! are part of the service's observable contract, since every panel model
//! and every reflection call sees them verbatim.

/// Maximum characters of each panel answer quoted to the critic.
const CRITIC_ANSWER_EXCERPT: usize = 1000;

/// Templates for every prompt the pipeline sends upstream
pub struct JuryPrompt;

impl JuryPrompt {
    /// System prompt given to each panel model.
    pub fn jury_system() -> &'static str {
        r#"You are one of several expert models asked the same question independently.
Answer in English, concisely and directly.
State your reasoning briefly after your answer.
If you are uncertain, say so explicitly rather than guessing.
Your answer will be compared with the answers of other models to measure agreement, so address the question itself rather than meta-commentary."#
    }

    /// User message for a panel model, prepending context when present.
    pub fn user_message(question: &str, context: Option<&str>) -> String {
        match context {
            Some(ctx) if !ctx.is_empty() => {
                format!("Context: {ctx}\n\nQuestion: {question}")
            }
            _ => question.to_string(),
        }
    }

    /// System prompt for the reflection critic; the reply must be pure JSON.
    pub fn critic_system() -> &'static str {
        r#"You are a critical reviewer improving a consensus answer produced by several models.
Respond in English with pure JSON only — no prose, no markdown fences.
The JSON object must have exactly these fields:
{"qualityScore": <number 0-100>, "issues": [<strings>], "refinedAnswer": <string>}
qualityScore rates the consensus answer's accuracy and completeness.
issues lists concrete problems you found.
refinedAnswer is your improved version of the answer."#
    }

    /// User message for the reflection critic.
    ///
    /// Quotes the question, the chosen consensus answer, and each panel
    /// answer truncated to 1000 characters as `[<model>]: <text>` blocks
    /// separated by blank lines.
    pub fn critic_prompt(
        question: &str,
        representative: &str,
        answers: &[(String, String)],
    ) -> String {
        let panel = answers
            .iter()
            .map(|(model, text)| format!("[{model}]: {}", truncate(text, CRITIC_ANSWER_EXCERPT)))
            .collect::<Vec<_>>()
            .join("\n\n");

        format!(
            r#"Original question: {question}

Consensus answer chosen by the jury:
{representative}

Individual answers from the panel:
{panel}

Review the consensus answer against the individual answers and produce your JSON assessment."#
        )
    }

    /// System prompt for the output-moderation check.
    pub fn moderation_system() -> &'static str {
        r#"You are a content safety checker.
Respond with pure JSON only: {"safe": <boolean>, "concerns": [<strings>]}
Mark safe=false only for content that is dangerous, hateful, or clearly harmful."#
    }

    /// User message for the output-moderation check.
    pub fn moderation_prompt(answer: &str) -> String {
        format!("Evaluate the following answer for safety:\n\n{answer}")
    }
}

/// Truncate on a character boundary without splitting a code point.
fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_without_context() {
        assert_eq!(JuryPrompt::user_message("What is Rust?", None), "What is Rust?");
        assert_eq!(
            JuryPrompt::user_message("What is Rust?", Some("")),
            "What is Rust?"
        );
    }

    #[test]
    fn test_user_message_with_context() {
        let message = JuryPrompt::user_message("And the next one?", Some("Q: 2+2?\nA: 4"));
        assert_eq!(message, "Context: Q: 2+2?\nA: 4\n\nQuestion: And the next one?");
    }

    #[test]
    fn test_critic_prompt_quotes_panel() {
        let answers = vec![
            ("gpt-5.2".to_string(), "Answer one.".to_string()),
            ("claude-sonnet-4.5".to_string(), "Answer two.".to_string()),
        ];
        let prompt = JuryPrompt::critic_prompt("Q?", "Answer one.", &answers);
        assert!(prompt.contains("[gpt-5.2]: Answer one."));
        assert!(prompt.contains("[claude-sonnet-4.5]: Answer two."));
        assert!(prompt.contains("Original question: Q?"));
    }

    #[test]
    fn test_critic_prompt_truncates_long_answers() {
        let long = "x".repeat(5000);
        let answers = vec![("m".to_string(), long)];
        let prompt = JuryPrompt::critic_prompt("Q?", "a", &answers);
        assert!(prompt.contains(&"x".repeat(1000)));
        assert!(!prompt.contains(&"x".repeat(1001)));
    }

    #[test]
    fn test_critic_system_demands_json() {
        assert!(JuryPrompt::critic_system().contains("pure JSON"));
        assert!(JuryPrompt::critic_system().contains("qualityScore"));
    }
}
