//! Configuration types for Simulon.
//!
//! `SimulonConfig` represents the top-level `config.toml`. Every field has a
//! default, so an empty or missing file yields a working configuration.

use serde::{Deserialize, Serialize};

use crate::think::ThinkMode;

/// Top-level configuration, loaded from `~/.simulon/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulonConfig {
    #[serde(default)]
    pub provider: ProviderSettings,

    #[serde(default)]
    pub think: LoopSettings,

    #[serde(default)]
    pub sessions: SessionSettings,
}

/// Where and how chat completions are requested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Base URL of an OpenAI-compatible API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model identifier sent with every call.
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub temperature: Option<f64>,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: None,
        }
    }
}

/// When the loop asks the model for a persona line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonaMode {
    /// No persona calls at all.
    Off,
    /// Derive one persona from the seed before the first round.
    Once,
    /// Derive a seed persona, then refresh it after every round and append
    /// the refreshed line to the context as the newest system message.
    #[default]
    EveryRound,
}

/// Knobs of the conversation loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopSettings {
    /// Upper bound on pairs produced per request.
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
    /// Delay between iterations for incremental delivery modes.
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
    #[serde(default)]
    pub persona: PersonaMode,
    /// Mode used when a request does not name one.
    #[serde(default)]
    pub default_mode: ThinkMode,
}

fn default_max_rounds() -> u32 {
    10
}

fn default_pacing_ms() -> u64 {
    1000
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
            pacing_ms: default_pacing_ms(),
            persona: PersonaMode::default(),
            default_mode: ThinkMode::default(),
        }
    }
}

/// Expiry policy of the session store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Idle time after which a session is dropped.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// How often expired sessions are swept.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_ttl_secs() -> u64 {
    3600
}

fn default_sweep_interval_secs() -> u64 {
    60
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_values() {
        let config = SimulonConfig::default();
        assert_eq!(config.provider.model, "gpt-4");
        assert_eq!(config.provider.base_url, "https://api.openai.com/v1");
        assert_eq!(config.think.max_rounds, 10);
        assert_eq!(config.think.pacing_ms, 1000);
        assert_eq!(config.think.persona, PersonaMode::EveryRound);
        assert_eq!(config.think.default_mode, ThinkMode::Stream);
        assert_eq!(config.sessions.ttl_secs, 3600);
    }

    #[test]
    fn test_config_deserialize_empty() {
        let config: SimulonConfig = toml::from_str("").unwrap();
        assert_eq!(config.think.max_rounds, 10);
        assert_eq!(config.sessions.sweep_interval_secs, 60);
    }

    #[test]
    fn test_config_deserialize_partial_sections() {
        let toml_str = r#"
[provider]
model = "gpt-4o-mini"
temperature = 0.2

[think]
max_rounds = 3
persona = "off"
default_mode = "batch"
"#;
        let config: SimulonConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.provider.model, "gpt-4o-mini");
        assert_eq!(config.provider.max_tokens, 1024);
        assert_eq!(config.provider.temperature, Some(0.2));
        assert_eq!(config.think.max_rounds, 3);
        assert_eq!(config.think.pacing_ms, 1000);
        assert_eq!(config.think.persona, PersonaMode::Off);
        assert_eq!(config.think.default_mode, ThinkMode::Batch);
        assert_eq!(config.sessions.ttl_secs, 3600);
    }
}
