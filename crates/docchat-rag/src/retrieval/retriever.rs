//! Question answering over the knowledge base

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::generation::PromptBuilder;
use crate::providers::LlmProvider;
use crate::types::{Citation, QueryResponse};

use super::store::KnowledgeBase;

/// Retrieves context and asks the generation service; stateless across calls
pub struct Retriever {
    kb: Arc<KnowledgeBase>,
    llm: Arc<dyn LlmProvider>,
    default_top_k: usize,
    default_timeout: Duration,
}

impl Retriever {
    pub fn new(
        kb: Arc<KnowledgeBase>,
        llm: Arc<dyn LlmProvider>,
        default_top_k: usize,
        default_timeout: Duration,
    ) -> Self {
        Self {
            kb,
            llm,
            default_top_k,
            default_timeout,
        }
    }

    /// The generation provider in use
    pub fn llm(&self) -> &Arc<dyn LlmProvider> {
        &self.llm
    }

    /// Answer `question` from the `top_k` most similar chunks
    ///
    /// Blank questions are rejected before retrieval. Generation failures and
    /// timeouts do not fail the call; they become the answer text.
    pub async fn answer(
        &self,
        question: &str,
        top_k: Option<usize>,
        timeout: Option<Duration>,
    ) -> Result<QueryResponse> {
        if question.trim().is_empty() {
            return Err(Error::EmptyQuery);
        }

        let start = Instant::now();
        let k = top_k.unwrap_or(self.default_top_k);
        let results = self.kb.search(question, k).await?;

        let context = PromptBuilder::build_context(&results);
        let prompt = PromptBuilder::build_rag_prompt(question, &context);
        let timeout = timeout.unwrap_or(self.default_timeout);

        let response = match tokio::time::timeout(timeout, self.llm.generate(&prompt)).await {
            Ok(Ok(answer)) => answer,
            Ok(Err(e)) => {
                tracing::warn!("Generation failed: {}", e);
                format!("Error generating response: {}", e)
            }
            Err(_) => {
                tracing::warn!("Generation timed out after {:?}", timeout);
                format!("Error generating response: timed out after {}s", timeout.as_secs_f32())
            }
        };

        let sources = results
            .iter()
            .map(|r| Citation::new(&r.chunk.source_ref(), r.score))
            .collect();

        tracing::info!(
            "Answered with {} context chunks in {}ms",
            results.len(),
            start.elapsed().as_millis()
        );
        Ok(QueryResponse::new(response, sources))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SparseConfig;
    use crate::retrieval::PendingDocument;
    use crate::types::Chunk;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingLlm {
        prompts: Mutex<Vec<String>>,
        fail: bool,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl LlmProvider for RecordingLlm {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().push(prompt.to_string());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(Error::external("service unavailable"));
            }
            Ok("Paris.".to_string())
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "recording"
        }

        fn model(&self) -> &str {
            "stub"
        }
    }

    async fn populated_kb() -> Arc<KnowledgeBase> {
        let kb = Arc::new(KnowledgeBase::sparse(&SparseConfig::default()));
        kb.ingest(vec![
            PendingDocument::new(
                "geo.txt",
                vec![Chunk::new("Paris is the capital of France.".into(), "geo.txt", 0)],
            ),
            PendingDocument::new(
                "misc.txt",
                vec![Chunk::new("Rust is a systems language.".into(), "misc.txt", 0)],
            ),
        ])
        .await
        .unwrap();
        kb
    }

    fn retriever(kb: Arc<KnowledgeBase>, llm: Arc<RecordingLlm>) -> Retriever {
        Retriever::new(kb, llm, 3, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_answer_with_sources() {
        let llm = Arc::new(RecordingLlm::default());
        let retriever = retriever(populated_kb().await, Arc::clone(&llm));

        let answer = retriever
            .answer("What is the capital of France?", Some(1), None)
            .await
            .unwrap();

        assert_eq!(answer.response, "Paris.");
        assert_eq!(answer.sources.len(), 1);
        assert_eq!(answer.sources[0].source, "geo.txt");
        assert_eq!(answer.sources[0].position, 0);

        let prompts = llm.prompts.lock();
        assert!(prompts[0].contains("Context:\nParis is the capital of France.\n\nQuestion:"));
    }

    #[tokio::test]
    async fn test_blank_question_skips_generation() {
        let llm = Arc::new(RecordingLlm::default());
        let retriever = retriever(populated_kb().await, Arc::clone(&llm));

        assert!(matches!(
            retriever.answer("   ", None, None).await,
            Err(Error::EmptyQuery)
        ));
        assert!(llm.prompts.lock().is_empty());
    }

    #[tokio::test]
    async fn test_empty_index_still_generates() {
        let llm = Arc::new(RecordingLlm::default());
        let kb = Arc::new(KnowledgeBase::sparse(&SparseConfig::default()));
        let answer = retriever(kb, Arc::clone(&llm))
            .answer("Anything?", None, None)
            .await
            .unwrap();

        assert!(answer.sources.is_empty());
        assert!(llm.prompts.lock()[0].contains("Context:\n\n\nQuestion: Anything?"));
    }

    #[tokio::test]
    async fn test_generation_failure_becomes_answer() {
        let llm = Arc::new(RecordingLlm {
            fail: true,
            ..Default::default()
        });
        let answer = retriever(populated_kb().await, llm)
            .answer("What is the capital of France?", None, None)
            .await
            .unwrap();

        assert_eq!(
            answer.response,
            "Error generating response: External service error: service unavailable"
        );
        assert_eq!(answer.sources.len(), 2);
    }

    #[tokio::test]
    async fn test_generation_timeout() {
        let llm = Arc::new(RecordingLlm {
            delay: Some(Duration::from_secs(5)),
            ..Default::default()
        });
        let answer = retriever(populated_kb().await, llm)
            .answer("capital?", None, Some(Duration::from_millis(20)))
            .await
            .unwrap();

        assert!(answer.response.starts_with("Error generating response: timed out"));
    }
}
