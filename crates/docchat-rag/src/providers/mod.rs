//! Provider abstractions for dense embeddings and answer generation
//!
//! Trait-based seams let the service switch between the local hashing
//! encoder, Ollama and Anthropic without touching the pipeline.

pub mod embedding;
pub mod llm;
pub mod ollama;

pub use embedding::EmbeddingProvider;
pub use llm::LlmProvider;
pub use ollama::{OllamaEmbedder, OllamaLlm};

use std::sync::Arc;

use crate::config::{DenseBackend, LlmBackend, RagConfig, VectorizerStrategy};
use crate::error::Result;
use crate::generation::AnthropicClient;
use crate::vectorize::HashingEmbedder;

/// Dense encoder for the configured strategy; `None` in sparse mode
pub fn build_embedder(config: &RagConfig) -> Result<Option<Arc<dyn EmbeddingProvider>>> {
    if config.vectorizer.strategy != VectorizerStrategy::Dense {
        return Ok(None);
    }

    let dense = &config.vectorizer.dense;
    let embedder: Arc<dyn EmbeddingProvider> = match dense.backend {
        DenseBackend::Hashing => Arc::new(HashingEmbedder::new(dense.dimensions)),
        DenseBackend::Ollama => Arc::new(OllamaEmbedder::from_config(dense, &config.llm)?),
    };
    tracing::info!(
        "Dense embeddings via {} ({} dimensions)",
        embedder.name(),
        embedder.dimensions()
    );
    Ok(Some(embedder))
}

/// Generation provider for the configured backend
pub fn build_llm(config: &RagConfig) -> Result<Arc<dyn LlmProvider>> {
    let llm: Arc<dyn LlmProvider> = match config.llm.provider {
        LlmBackend::Anthropic => Arc::new(AnthropicClient::from_config(&config.llm)?),
        LlmBackend::Ollama => Arc::new(OllamaLlm::from_config(&config.llm)?),
    };
    tracing::info!("Generation via {} ({})", llm.name(), llm.model());
    Ok(llm)
}
