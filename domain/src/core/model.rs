//! Model value object representing an LLM backend

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An LLM backend reachable through the Model Router (Value Object)
///
/// The jury panel is a set of these. Identifiers round-trip through the
/// Router's chat-completion API unchanged; unknown identifiers are carried
/// as [`Model::Custom`] so operators can configure arbitrary backends.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Model {
    // GPT family
    Gpt52,
    Gpt51,
    Gpt5Mini,
    // Claude family
    ClaudeSonnet45,
    ClaudeHaiku45,
    ClaudeOpus45,
    // Gemini family
    Gemini3Pro,
    Gemini3Flash,
    // Custom
    Custom(String),
}

impl Model {
    /// Get the string identifier for this model
    pub fn as_str(&self) -> &str {
        match self {
            Model::Gpt52 => "gpt-5.2",
            Model::Gpt51 => "gpt-5.1",
            Model::Gpt5Mini => "gpt-5-mini",
            Model::ClaudeSonnet45 => "claude-sonnet-4.5",
            Model::ClaudeHaiku45 => "claude-haiku-4.5",
            Model::ClaudeOpus45 => "claude-opus-4.5",
            Model::Gemini3Pro => "gemini-3-pro-preview",
            Model::Gemini3Flash => "gemini-3-flash",
            Model::Custom(s) => s,
        }
    }

    /// Get the default jury panel: one model per provider family.
    pub fn default_panel() -> Vec<Model> {
        vec![Model::Gpt52, Model::ClaudeSonnet45, Model::Gemini3Pro]
    }

    /// Check if this is a Claude model
    pub fn is_claude(&self) -> bool {
        matches!(
            self,
            Model::ClaudeSonnet45 | Model::ClaudeHaiku45 | Model::ClaudeOpus45
        )
    }

    /// Check if this is a GPT model
    pub fn is_gpt(&self) -> bool {
        matches!(self, Model::Gpt52 | Model::Gpt51 | Model::Gpt5Mini)
    }

    /// Check if this is a Gemini model
    pub fn is_gemini(&self) -> bool {
        matches!(self, Model::Gemini3Pro | Model::Gemini3Flash)
    }
}

impl Default for Model {
    /// Returns the default critic model for the reflection pass (Claude family)
    fn default() -> Self {
        Model::ClaudeSonnet45
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Model {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "gpt-5.2" => Model::Gpt52,
            "gpt-5.1" => Model::Gpt51,
            "gpt-5-mini" => Model::Gpt5Mini,
            "claude-sonnet-4.5" => Model::ClaudeSonnet45,
            "claude-haiku-4.5" => Model::ClaudeHaiku45,
            "claude-opus-4.5" => Model::ClaudeOpus45,
            "gemini-3-pro-preview" => Model::Gemini3Pro,
            "gemini-3-flash" => Model::Gemini3Flash,
            other => Model::Custom(other.to_string()),
        })
    }
}

impl Serialize for Model {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Model {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(s.parse().unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_roundtrip() {
        for model in Model::default_panel() {
            let s = model.to_string();
            let parsed: Model = s.parse().unwrap();
            assert_eq!(model, parsed);
        }
    }

    #[test]
    fn test_custom_model() {
        let model: Model = "in-house-model-v1".parse().unwrap();
        assert_eq!(model, Model::Custom("in-house-model-v1".to_string()));
        assert_eq!(model.to_string(), "in-house-model-v1");
    }

    #[test]
    fn test_model_family_detection() {
        assert!(Model::ClaudeSonnet45.is_claude());
        assert!(Model::Gpt52.is_gpt());
        assert!(Model::Gemini3Pro.is_gemini());
        assert!(!Model::ClaudeSonnet45.is_gpt());
    }

    #[test]
    fn test_default_panel_spans_families() {
        let panel = Model::default_panel();
        assert_eq!(panel.len(), 3);
        assert!(panel.iter().any(|m| m.is_gpt()));
        assert!(panel.iter().any(|m| m.is_claude()));
        assert!(panel.iter().any(|m| m.is_gemini()));
    }
}
