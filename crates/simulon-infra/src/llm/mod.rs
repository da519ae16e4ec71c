//! LLM provider implementations.
//!
//! Contains the concrete implementation of the [`LlmProvider`] trait defined
//! in `simulon-core` and a factory ([`create_provider`]) that builds it from
//! the loaded configuration.
//!
//! [`LlmProvider`]: simulon_core::llm::provider::LlmProvider

pub mod openai_compat;

use secrecy::SecretString;

use simulon_core::llm::box_provider::BoxLlmProvider;
use simulon_types::config::ProviderSettings;

use self::openai_compat::OpenAiCompatibleProvider;
use self::openai_compat::config::OpenAiCompatConfig;

/// Create a [`BoxLlmProvider`] for the configured OpenAI-compatible endpoint.
pub fn create_provider(settings: &ProviderSettings, api_key: SecretString) -> BoxLlmProvider {
    let config = OpenAiCompatConfig::from_settings(settings, api_key);
    tracing::info!(
        provider = %config.provider_name,
        base_url = %config.base_url,
        model = %config.model,
        "LLM provider configured"
    );
    BoxLlmProvider::new(OpenAiCompatibleProvider::new(config))
}
