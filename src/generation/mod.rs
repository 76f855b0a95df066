//! Answer synthesis: prompt assembly and LLM invocation

pub mod prompt;
pub mod synthesizer;

pub use prompt::{truncate_excerpt, PromptBuilder};
pub use synthesizer::AnswerSynthesizer;
