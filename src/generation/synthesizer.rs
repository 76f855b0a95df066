//! Answer synthesis with source attribution

use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::providers::LlmProvider;
use crate::retrieval::RetrievedFragment;
use crate::types::document::Document;
use crate::types::query::QueryRequest;
use crate::types::response::{QueryResponse, SourceCitation, SourceMetadata};

use super::prompt::{truncate_excerpt, PromptBuilder};

/// Characters of fragment text shown in a citation excerpt
pub const EXCERPT_LEN: usize = 200;

/// Combines retrieved fragments into a prompt, invokes the language model,
/// and attaches source citations to the answer.
///
/// Never returns an error: retrieval gaps and LLM failures become a
/// degraded response (empty answer, error metadata) so callers always
/// receive a well-formed reply.
pub struct AnswerSynthesizer {
    llm: Arc<dyn LlmProvider>,
}

impl AnswerSynthesizer {
    /// Create a synthesizer over the given LLM provider
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Synthesize an answer from retrieved fragments.
    ///
    /// `documents` maps fragment document ids to their records, used to
    /// attach filenames to citations.
    pub async fn synthesize(
        &self,
        request: &QueryRequest,
        fragments: Vec<RetrievedFragment>,
        documents: &HashMap<Uuid, Document>,
    ) -> QueryResponse {
        if fragments.is_empty() {
            return QueryResponse::degraded(
                "no_results",
                "No relevant fragments were found for this query",
            );
        }

        let citations: Vec<SourceCitation> = fragments
            .iter()
            .map(|fragment| SourceCitation {
                text: truncate_excerpt(&fragment.chunk.text, EXCERPT_LEN),
                score: fragment.score,
                metadata: SourceMetadata {
                    document_id: fragment.chunk.document_id,
                    chunk_id: fragment.chunk.chunk_id,
                    chunk_index: fragment.chunk.chunk_index,
                    filename: documents
                        .get(&fragment.chunk.document_id)
                        .map(|d| d.filename.clone())
                        .unwrap_or_else(|| "unknown".to_string()),
                    page_number: fragment.chunk.page_number,
                    section: fragment.chunk.section.clone(),
                },
            })
            .collect();

        let context = PromptBuilder::build_context(&fragments, &citations);
        let prompt = PromptBuilder::build_rag_prompt(&request.query, &context);

        match self.llm.generate(&prompt, request.temperature).await {
            Ok(answer) => {
                let mut metadata = HashMap::new();
                metadata.insert(
                    "query".to_string(),
                    serde_json::Value::String(request.query.clone()),
                );
                metadata.insert(
                    "num_sources".to_string(),
                    serde_json::Value::from(citations.len()),
                );
                metadata.insert(
                    "model".to_string(),
                    serde_json::Value::String(self.llm.model().to_string()),
                );
                QueryResponse::new(answer, citations, metadata)
            }
            Err(e) => {
                tracing::error!("Answer generation failed: {}", e);
                QueryResponse::degraded("llm_error", e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::types::document::Chunk;
    use async_trait::async_trait;

    struct StubLlm {
        fail: bool,
    }

    #[async_trait]
    impl LlmProvider for StubLlm {
        async fn generate(&self, prompt: &str, _temperature: f32) -> Result<String> {
            if self.fail {
                Err(Error::llm("model unreachable"))
            } else {
                Ok(format!("answer derived from {} chars of prompt", prompt.len()))
            }
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(!self.fail)
        }

        fn provider_id(&self) -> &str {
            "stub"
        }

        fn model(&self) -> &str {
            "stub-model"
        }
    }

    fn sample_document() -> Document {
        Document::new(
            Uuid::new_v4(),
            "default_user",
            "notes.txt",
            "text/plain",
            "./uploads/notes.txt",
        )
    }

    fn sample_fragment(document: &Document, text: &str, score: f32) -> RetrievedFragment {
        RetrievedFragment {
            chunk: Chunk::new(document, text.to_string(), 0, "v1"),
            score,
        }
    }

    #[tokio::test]
    async fn synthesizes_answer_with_citations() {
        let document = sample_document();
        let fragment = sample_fragment(&document, "The deadline is Friday.", 0.92);
        let mut documents = HashMap::new();
        documents.insert(document.document_id, document.clone());

        let synthesizer = AnswerSynthesizer::new(Arc::new(StubLlm { fail: false }));
        let request = QueryRequest::new("when is the deadline?");
        let response = synthesizer
            .synthesize(&request, vec![fragment], &documents)
            .await;

        assert!(!response.is_degraded());
        assert!(!response.answer.is_empty());
        assert_eq!(response.sources.len(), 1);
        assert_eq!(response.sources[0].metadata.filename, "notes.txt");
        assert!((response.sources[0].score - 0.92).abs() < f32::EPSILON);
        assert_eq!(response.metadata["model"], "stub-model");
    }

    #[tokio::test]
    async fn llm_failure_degrades_instead_of_erroring() {
        let document = sample_document();
        let fragment = sample_fragment(&document, "Some content.", 0.5);
        let documents = HashMap::new();

        let synthesizer = AnswerSynthesizer::new(Arc::new(StubLlm { fail: true }));
        let request = QueryRequest::new("anything?");
        let response = synthesizer
            .synthesize(&request, vec![fragment], &documents)
            .await;

        assert!(response.is_degraded());
        assert!(response.answer.is_empty());
        assert!(response.sources.is_empty());
        assert_eq!(response.metadata["error_type"], "llm_error");
    }

    #[tokio::test]
    async fn empty_retrieval_yields_well_formed_degraded_response() {
        let synthesizer = AnswerSynthesizer::new(Arc::new(StubLlm { fail: false }));
        let request = QueryRequest::new("query against empty index");
        let response = synthesizer
            .synthesize(&request, Vec::new(), &HashMap::new())
            .await;

        assert!(response.is_degraded());
        assert!(response.sources.is_empty());
        assert_eq!(response.metadata["error_type"], "no_results");
    }

    #[tokio::test]
    async fn long_fragments_are_truncated_in_citations() {
        let document = sample_document();
        let long_text = "relevant content ".repeat(100);
        let fragment = sample_fragment(&document, &long_text, 0.8);
        let mut documents = HashMap::new();
        documents.insert(document.document_id, document.clone());

        let synthesizer = AnswerSynthesizer::new(Arc::new(StubLlm { fail: false }));
        let request = QueryRequest::new("what is relevant?");
        let response = synthesizer
            .synthesize(&request, vec![fragment], &documents)
            .await;

        assert!(response.sources[0].text.len() <= EXCERPT_LEN + 3);
        assert!(response.sources[0].text.ends_with("..."));
    }
}
