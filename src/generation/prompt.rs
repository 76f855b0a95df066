//! Prompt templates for grounded answer generation

use crate::retrieval::RetrievedFragment;
use crate::types::response::SourceCitation;

/// Characters of fragment text included in the LLM context per source
pub const CONTEXT_FRAGMENT_LEN: usize = 2000;

/// Prompt builder for RAG queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build the bounded context window from retrieved fragments.
    ///
    /// `citations` runs parallel to `fragments` and supplies the resolved
    /// source labels.
    pub fn build_context(fragments: &[RetrievedFragment], citations: &[SourceCitation]) -> String {
        let mut context = String::new();

        for (i, (fragment, citation)) in fragments.iter().zip(citations).enumerate() {
            let mut label = citation.metadata.filename.clone();
            if let Some(page) = citation.metadata.page_number {
                label.push_str(&format!(", Page {}", page));
            }
            if let Some(section) = &citation.metadata.section {
                label.push_str(&format!(", Section: {}", section));
            }

            context.push_str(&format!(
                "[{}] {}\n\n{}\n\n---\n\n",
                i + 1,
                label,
                truncate_excerpt(&fragment.chunk.text, CONTEXT_FRAGMENT_LEN)
            ));
        }

        context
    }

    /// Build the full grounded RAG prompt
    pub fn build_rag_prompt(question: &str, context: &str) -> String {
        format!(
            r#"You are a document-grounded assistant that ONLY uses information from provided documents.

RULES:
1. ONLY use information that is explicitly stated in the CONTEXT below.
2. If the answer is not in the context, respond with "This information is not available in the provided documents."
3. NEVER use external knowledge or make inferences beyond what is stated.
4. Reference sources by their bracketed number, e.g. [1].

CONTEXT FROM DOCUMENTS:
{context}

QUESTION: {question}

Provide a grounded answer using ONLY the document content above:"#,
            context = context,
            question = question
        )
    }
}

/// Truncate text to a maximum length, preferring a word boundary and never
/// splitting a UTF-8 character
pub fn truncate_excerpt(text: &str, max_len: usize) -> String {
    if text.len() <= max_len {
        return text.to_string();
    }

    let mut end = max_len;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }

    if let Some(pos) = text[..end].rfind(' ') {
        return format!("{}...", &text[..pos]);
    }

    format!("{}...", &text[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_excerpt("short", 200), "short");
    }

    #[test]
    fn long_text_is_cut_at_word_boundary() {
        let text = "word ".repeat(100);
        let excerpt = truncate_excerpt(&text, 50);
        assert!(excerpt.len() <= 53);
        assert!(excerpt.ends_with("..."));
        assert!(!excerpt.contains("word wor..."));
    }

    #[test]
    fn multibyte_text_is_cut_on_char_boundary() {
        let text = "ü".repeat(100);
        let excerpt = truncate_excerpt(&text, 33);
        assert!(excerpt.ends_with("..."));
        assert!(excerpt.is_char_boundary(excerpt.len() - 3));
    }

    #[test]
    fn prompt_contains_question_and_context() {
        let prompt = PromptBuilder::build_rag_prompt("what is x?", "[1] notes.txt\n\nx is y");
        assert!(prompt.contains("what is x?"));
        assert!(prompt.contains("x is y"));
    }
}
