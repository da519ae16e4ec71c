//! Model-call engine for the conversation loop.
//!
//! ThinkEngine turns each loop step into one `CompletionRequest`, sends it
//! through `BoxLlmProvider` exactly once, and returns the trimmed completion
//! text. Every call runs inside a GenAI-attributed tracing span.

use std::sync::Arc;

use tracing::{Instrument, debug, info_span};

use simulon_types::config::ProviderSettings;
use simulon_types::llm::{CompletionRequest, LlmError, Message};
use simulon_types::think::QaPair;

use crate::llm::box_provider::BoxLlmProvider;

use super::prompt;

pub const OP_PERSONA: &str = "derive_persona";
pub const OP_FOLLOW_UP: &str = "follow_up";
pub const OP_ANSWER: &str = "answer";
pub const OP_REPLY: &str = "chat";

/// Executes the loop's model calls.
pub struct ThinkEngine {
    provider: Arc<BoxLlmProvider>,
    model: String,
    max_tokens: u32,
    temperature: Option<f64>,
}

impl ThinkEngine {
    pub fn new(provider: Arc<BoxLlmProvider>, settings: &ProviderSettings) -> Self {
        Self {
            provider,
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Persona line for a fresh loop.
    pub async fn derive_persona(&self, seed: &str) -> Result<String, LlmError> {
        let text = self.call(OP_PERSONA, prompt::seed_persona(seed)).await?;
        Ok(prompt::persona_line(&text))
    }

    /// Persona line re-evaluated from the latest pair.
    pub async fn refresh_persona(&self, pair: &QaPair) -> Result<String, LlmError> {
        let text = self.call(OP_PERSONA, prompt::refreshed_persona(pair)).await?;
        Ok(prompt::persona_line(&text))
    }

    /// Follow-up question conditioned on the running context.
    pub async fn follow_up(&self, context: &[Message]) -> Result<String, LlmError> {
        self.call(OP_FOLLOW_UP, prompt::follow_up(context)).await
    }

    /// Concise answer to a question, without the running context.
    pub async fn answer(&self, question: &str) -> Result<String, LlmError> {
        self.call(OP_ANSWER, prompt::answer(question)).await
    }

    /// Plain assistant reply to a full context (single-turn mode).
    pub async fn reply(&self, context: Vec<Message>) -> Result<String, LlmError> {
        self.call(OP_REPLY, context).await
    }

    async fn call(&self, operation: &'static str, messages: Vec<Message>) -> Result<String, LlmError> {
        let request = CompletionRequest {
            model: self.model.clone(),
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let span = info_span!(
            "gen_ai.complete",
            gen_ai.operation.name = operation,
            gen_ai.provider.name = self.provider.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.max_tokens = request.max_tokens,
            message_count = request.messages.len(),
        );

        let response = self.provider.complete(&request).instrument(span).await?;
        debug!(
            operation,
            response_id = %response.id,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            stop_reason = %response.stop_reason,
            "completion received"
        );

        let text = response.content.trim();
        if text.is_empty() {
            return Err(LlmError::EmptyCompletion);
        }
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::LlmProvider;
    use simulon_types::llm::{
        CompletionResponse, MessageRole, ProviderCapabilities, StopReason, Usage,
    };
    use std::sync::Mutex;

    struct EchoProvider {
        capabilities: ProviderCapabilities,
        reply: String,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl EchoProvider {
        fn new(reply: &str) -> Self {
            Self {
                capabilities: ProviderCapabilities {
                    max_context_tokens: 8_192,
                    max_output_tokens: 1_024,
                },
                reply: reply.to_string(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl LlmProvider for Arc<EchoProvider> {
        fn name(&self) -> &str {
            "echo"
        }

        fn capabilities(&self) -> &ProviderCapabilities {
            &self.capabilities
        }

        async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(CompletionResponse {
                id: "resp-1".to_string(),
                content: self.reply.clone(),
                model: request.model.clone(),
                stop_reason: StopReason::EndTurn,
                usage: Usage::default(),
            })
        }
    }

    fn engine_for(provider: &Arc<EchoProvider>) -> ThinkEngine {
        let settings = ProviderSettings {
            model: "test-model".to_string(),
            max_tokens: 256,
            ..ProviderSettings::default()
        };
        ThinkEngine::new(Arc::new(BoxLlmProvider::new(provider.clone())), &settings)
    }

    #[tokio::test]
    async fn completions_are_trimmed() {
        let provider = Arc::new(EchoProvider::new("  What next?\n"));
        let engine = engine_for(&provider);
        assert_eq!(engine.follow_up(&[]).await.unwrap(), "What next?");
    }

    #[tokio::test]
    async fn blank_completion_is_malformed() {
        let provider = Arc::new(EchoProvider::new("   \n"));
        let engine = engine_for(&provider);
        assert!(matches!(
            engine.answer("q").await,
            Err(LlmError::EmptyCompletion)
        ));
    }

    #[tokio::test]
    async fn requests_carry_model_settings() {
        let provider = Arc::new(EchoProvider::new("ok"));
        let engine = engine_for(&provider);
        engine.answer("Why?").await.unwrap();

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].model, "test-model");
        assert_eq!(seen[0].max_tokens, 256);
        assert_eq!(seen[0].messages[0].role, MessageRole::System);
    }

    #[tokio::test]
    async fn persona_is_normalized() {
        let provider = Arc::new(EchoProvider::new("wandering philosopher."));
        let engine = engine_for(&provider);
        assert_eq!(
            engine.derive_persona("What is consciousness?").await.unwrap(),
            "You are a wandering philosopher."
        );
    }
}
