//! Language model provider trait

use async_trait::async_trait;

use crate::error::Result;

/// Trait for LLM-based text generation
///
/// Implementations:
/// - `OpenAiLlm`: OpenAI-compatible remote API
/// - `OllamaLlm`: local Ollama server
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate free text for a prompt
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String>;

    /// Check if the provider is reachable
    async fn health_check(&self) -> Result<bool>;

    /// Stable provider identifier for logging and diagnostics
    fn provider_id(&self) -> &str;

    /// The model being used
    fn model(&self) -> &str;
}
