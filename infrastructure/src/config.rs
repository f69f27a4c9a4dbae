//! Environment configuration
//!
//! Every deployment knob arrives through environment variables, merged
//! over built-in defaults with figment. Feature flags follow the service
//! convention: enabled unless set to the literal string `"false"`.

use compass_application::JuryParams;
use compass_domain::Model;
use figment::{
    providers::{Env, Serialized},
    Figment,
};
use serde::{Deserialize, Deserializer, Serialize};

/// Environment variables the service reads.
const ENV_KEYS: &[&str] = &[
    "MODEL_ROUTER_URL",
    "MODEL_ROUTER_TOKEN",
    "PAP_STATION_URL",
    "PAP_AGENT_ID",
    "PAP_AGENT_KEY",
    "PAP_COLLECTOR_URL",
    "COMPASS_MODELS",
    "REFLECTION_MODEL",
    "ENABLE_REFLECTION",
    "ENABLE_MEMORY",
    "ENABLE_GUARDRAILS",
    "SESSION_TTL_SECONDS",
    "PORT",
    "BASE_URL",
];

/// Full service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompassConfig {
    pub model_router_url: String,
    pub model_router_token: String,
    pub pap_station_url: String,
    pub pap_agent_id: String,
    pub pap_agent_key: Option<String>,
    pub pap_collector_url: Option<String>,
    /// Comma-separated default panel
    pub compass_models: String,
    pub reflection_model: String,
    #[serde(deserialize_with = "feature_flag")]
    pub enable_reflection: bool,
    #[serde(deserialize_with = "feature_flag")]
    pub enable_memory: bool,
    #[serde(deserialize_with = "feature_flag")]
    pub enable_guardrails: bool,
    pub session_ttl_seconds: u64,
    pub port: u16,
    pub base_url: String,
}

impl Default for CompassConfig {
    fn default() -> Self {
        Self {
            model_router_url: "http://localhost:8080".to_string(),
            model_router_token: String::new(),
            pap_station_url: "http://localhost:9000".to_string(),
            pap_agent_id: "compass-dev".to_string(),
            pap_agent_key: None,
            pap_collector_url: None,
            compass_models: "gpt-5.2,claude-sonnet-4.5,gemini-3-pro-preview".to_string(),
            reflection_model: "claude-sonnet-4.5".to_string(),
            enable_reflection: true,
            enable_memory: true,
            enable_guardrails: true,
            session_ttl_seconds: 3600,
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
        }
    }
}

impl CompassConfig {
    /// Load defaults merged with the process environment.
    pub fn load() -> Result<Self, Box<figment::Error>> {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Env::raw().only(ENV_KEYS))
            .extract()
            .map_err(Box::new)
    }

    /// The configured default panel.
    pub fn models(&self) -> Vec<Model> {
        self.compass_models
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse().unwrap())
            .collect()
    }

    /// The configured reflection critic.
    pub fn reflection(&self) -> Model {
        self.reflection_model.parse().unwrap()
    }

    /// Resolve the pipeline parameters this configuration implies.
    pub fn jury_params(&self) -> JuryParams {
        JuryParams::default()
            .with_panel(self.models())
            .with_reflection_model(self.reflection())
            .with_flags(
                self.enable_reflection,
                self.enable_memory,
                self.enable_guardrails,
            )
    }
}

/// Deserialize a feature flag: enabled unless the value is boolean `false`
/// or the literal string `"false"`.
fn feature_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    struct FlagVisitor;

    impl serde::de::Visitor<'_> for FlagVisitor {
        type Value = bool;

        fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("a boolean or string feature flag")
        }

        fn visit_bool<E: serde::de::Error>(self, value: bool) -> Result<bool, E> {
            Ok(value)
        }

        fn visit_str<E: serde::de::Error>(self, value: &str) -> Result<bool, E> {
            Ok(value.trim() != "false")
        }
    }

    deserializer.deserialize_any(FlagVisitor)
}
