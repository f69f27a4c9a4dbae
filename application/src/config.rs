//! Pipeline parameters
//!
//! Defaults match the service contract: the three-family panel, a
//! Claude-family critic, and every feature flag enabled. The binary
//! overrides these from the environment.

use compass_domain::Model;

/// Resolved parameters for the jury pipeline
#[derive(Debug, Clone)]
pub struct JuryParams {
    /// Default panel used when a request names no models
    pub panel: Vec<Model>,
    /// Model used for the reflection critic
    pub reflection_model: Model,
    /// Run the reflection pass by default
    pub enable_reflection: bool,
    /// Inject and record session memory by default
    pub enable_memory: bool,
    /// Validate input by default
    pub enable_guardrails: bool,
    /// Run the post-aggregation output-moderation call
    pub moderate_output: bool,
}

impl Default for JuryParams {
    fn default() -> Self {
        Self {
            panel: Model::default_panel(),
            reflection_model: Model::default(),
            enable_reflection: true,
            enable_memory: true,
            enable_guardrails: true,
            moderate_output: false,
        }
    }
}

impl JuryParams {
    pub fn with_panel(mut self, panel: Vec<Model>) -> Self {
        if !panel.is_empty() {
            self.panel = panel;
        }
        self
    }

    pub fn with_reflection_model(mut self, model: Model) -> Self {
        self.reflection_model = model;
        self
    }

    pub fn with_flags(mut self, reflection: bool, memory: bool, guardrails: bool) -> Self {
        self.enable_reflection = reflection;
        self.enable_memory = memory;
        self.enable_guardrails = guardrails;
        self
    }

    pub fn with_output_moderation(mut self) -> Self {
        self.moderate_output = true;
        self
    }
}
