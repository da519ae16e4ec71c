//! Configuration for the OpenAI-compatible provider.

use secrecy::SecretString;

use simulon_types::config::ProviderSettings;
use simulon_types::llm::ProviderCapabilities;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Configuration for an [`super::OpenAiCompatibleProvider`].
pub struct OpenAiCompatConfig {
    /// Human-readable provider name ("openai" or "openai_compatible").
    pub provider_name: String,
    /// Base URL for the API (e.g., "https://api.openai.com/v1").
    pub base_url: String,
    pub api_key: SecretString,
    /// Default model identifier, used when a request names none.
    pub model: String,
    pub capabilities: ProviderCapabilities,
}

impl OpenAiCompatConfig {
    pub fn from_settings(settings: &ProviderSettings, api_key: SecretString) -> Self {
        let base_url = settings.base_url.trim_end_matches('/').to_string();
        let provider_name = if base_url == OPENAI_BASE_URL {
            "openai"
        } else {
            "openai_compatible"
        };
        Self {
            provider_name: provider_name.into(),
            capabilities: capabilities_for(&settings.model),
            base_url,
            api_key,
            model: settings.model.clone(),
        }
    }
}

/// Context and output limits of well-known OpenAI models.
///
/// Unknown models (local servers, proxies) get a conservative 8K window.
pub fn capabilities_for(model: &str) -> ProviderCapabilities {
    let (max_context_tokens, max_output_tokens) = match model {
        m if m.starts_with("gpt-4o") || m.starts_with("gpt-4.1") => (128_000, 16_384),
        m if m.starts_with("gpt-4-turbo") => (128_000, 4_096),
        m if m.starts_with("gpt-4") => (8_192, 4_096),
        m if m.starts_with("gpt-3.5") => (16_385, 4_096),
        _ => (8_192, 4_096),
    };
    ProviderCapabilities {
        max_context_tokens,
        max_output_tokens,
    }
}
