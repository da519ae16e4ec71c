//! LlmProvider trait definition.
//!
//! The model API is an opaque remote function: an ordered message sequence
//! goes in, one assistant completion comes out, or the call fails.

use simulon_types::llm::{CompletionRequest, CompletionResponse, LlmError, ProviderCapabilities};

/// Trait for chat-completion backends.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition). Each call is
/// attempted exactly once; implementations must not retry.
///
/// Implementations live in simulon-infra (e.g., `OpenAiCompatibleProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "openai").
    fn name(&self) -> &str;

    /// Context and output limits of the backing model.
    fn capabilities(&self) -> &ProviderCapabilities;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
