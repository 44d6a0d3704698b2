//! Prompt template for grounded answers

use crate::retrieval::ScoredChunk;

/// Prompt builder for chat queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Join retrieved chunk texts in ranked order, separated by blank lines
    pub fn build_context(results: &[ScoredChunk]) -> String {
        results
            .iter()
            .map(|r| r.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Render the fixed question-answering template
    pub fn build_rag_prompt(question: &str, context: &str) -> String {
        format!(
            "Based on the following context, please answer the user's question. \
If the answer cannot be found in the context, please say so.

Context:
{context}

Question: {question}

Answer:"
        )
    }
}
