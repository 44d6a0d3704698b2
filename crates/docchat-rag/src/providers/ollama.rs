//! Ollama-based providers for embeddings and generation
//!
//! Wraps [`OllamaClient`] to implement the provider traits.

use async_trait::async_trait;
use futures_util::{stream, StreamExt, TryStreamExt};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{DenseConfig, LlmConfig};
use crate::error::{Error, Result};
use crate::generation::{OllamaClient, RetryPolicy};

use super::embedding::EmbeddingProvider;
use super::llm::LlmProvider;

/// Concurrent embedding requests per batch
const EMBED_CONCURRENCY: usize = 4;

/// Ollama embedding provider using nomic-embed-text or similar models
pub struct OllamaEmbedder {
    client: Arc<OllamaClient>,
    dimensions: usize,
    model: String,
}

impl OllamaEmbedder {
    /// Create from the dense vectorizer settings; timeouts and retries follow `llm`
    pub fn from_config(dense: &DenseConfig, llm: &LlmConfig) -> Result<Self> {
        let client = OllamaClient::new(
            dense.ollama_url.clone(),
            Duration::from_secs(llm.timeout_secs),
            RetryPolicy::from_config(llm),
        )?;
        Ok(Self::from_client(Arc::new(client), dense.dimensions, dense.ollama_model.clone()))
    }

    /// Create from existing OllamaClient
    pub fn from_client(client: Arc<OllamaClient>, dimensions: usize, model: String) -> Self {
        Self {
            client,
            dimensions,
            model,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embedding = self.client.embed(&self.model, text).await?;
        if embedding.len() != self.dimensions {
            return Err(Error::external(format!(
                "{} returned {} dimensions, expected {}",
                self.model,
                embedding.len(),
                self.dimensions
            )));
        }
        Ok(embedding)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        // No native batch endpoint; run a bounded number of requests at once
        stream::iter(
            texts
                .iter()
                .cloned()
                .map(|text| async move { self.embed(&text).await }),
        )
        .buffered(EMBED_CONCURRENCY)
        .try_collect()
        .await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Ollama LLM provider for answer generation
pub struct OllamaLlm {
    client: Arc<OllamaClient>,
    model: String,
    temperature: f32,
}

impl OllamaLlm {
    /// Create from the generation service configuration
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        Ok(Self::from_client(
            Arc::new(OllamaClient::from_config(config)?),
            config.model().to_string(),
            config.temperature,
        ))
    }

    /// Create from existing OllamaClient
    pub fn from_client(client: Arc<OllamaClient>, model: String, temperature: f32) -> Self {
        Self {
            client,
            model,
            temperature,
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.client.generate(&self.model, prompt, self.temperature).await
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Json, Router};
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_embed_batch_preserves_order_and_checks_dimensions() {
        let router = Router::new().route(
            "/api/embeddings",
            post(|Json(body): Json<Value>| async move {
                let len = body["prompt"].as_str().unwrap().len() as f32;
                Json(json!({ "embedding": [len, 1.0] }))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let dense = DenseConfig {
            ollama_url: format!("http://{}", addr),
            dimensions: 2,
            ..Default::default()
        };
        let embedder = OllamaEmbedder::from_config(&dense, &LlmConfig::default()).unwrap();
        let texts: Vec<String> = ["a", "bbb", "cc"].iter().map(|s| s.to_string()).collect();
        let vectors = embedder.embed_batch(&texts).await.unwrap();
        assert_eq!(vectors, vec![vec![1.0, 1.0], vec![3.0, 1.0], vec![2.0, 1.0]]);

        let wrong = DenseConfig { dimensions: 3, ..dense };
        let embedder = OllamaEmbedder::from_config(&wrong, &LlmConfig::default()).unwrap();
        assert!(matches!(embedder.embed("a").await, Err(Error::ExternalService(_))));
    }
}
