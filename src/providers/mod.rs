//! Provider abstractions for embeddings and answer generation
//!
//! Both concerns are trait seams with two interchangeable backends: an
//! OpenAI-compatible remote API and a locally hosted Ollama server. The
//! backend is selected once at startup from configuration and stays fixed
//! for the lifetime of the deployment, so the embedding dimension and
//! provider identity remain consistent for the lifetime of a collection.

pub mod embedding;
pub mod llm;
pub mod ollama;
pub mod openai;

pub use embedding::EmbeddingProvider;
pub use llm::LlmProvider;
pub use ollama::{OllamaEmbedder, OllamaLlm};
pub use openai::{OpenAiEmbedder, OpenAiLlm};
