//! Application state for the document chat server

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

use crate::config::RagConfig;
use crate::error::Result;
use crate::ingestion::{IngestPipeline, WordChunker};
use crate::providers::{self, EmbeddingProvider, LlmProvider};
use crate::retrieval::{KnowledgeBase, Retriever};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Index and vectorizer shared by upload and chat
    knowledge_base: Arc<KnowledgeBase>,
    /// Extraction and chunking
    pipeline: IngestPipeline,
    /// Question answering
    retriever: Retriever,
    /// When the state was built
    started_at: DateTime<Utc>,
    /// Set once every provider has passed a health check
    ready: RwLock<bool>,
}

impl AppState {
    /// Create application state with providers chosen from configuration
    pub fn new(config: RagConfig) -> Result<Self> {
        let embedder = providers::build_embedder(&config)?;
        let llm = providers::build_llm(&config)?;
        Self::with_providers(config, embedder, llm)
    }

    /// Create application state with explicit providers
    pub fn with_providers(
        config: RagConfig,
        embedder: Option<Arc<dyn EmbeddingProvider>>,
        llm: Arc<dyn LlmProvider>,
    ) -> Result<Self> {
        config.validate()?;
        tracing::info!(
            "Initializing application state (strategy: {}, chunking: {}/{} words)",
            config.vectorizer.strategy.as_str(),
            config.chunking.window_words,
            config.chunking.overlap_words
        );

        let knowledge_base = Arc::new(KnowledgeBase::from_config(&config, embedder)?);
        let pipeline = IngestPipeline::new(WordChunker::from_config(&config.chunking)?);
        let retriever = Retriever::new(
            Arc::clone(&knowledge_base),
            llm,
            config.retrieval.top_k,
            Duration::from_secs(config.llm.timeout_secs),
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                knowledge_base,
                pipeline,
                retriever,
                started_at: Utc::now(),
                ready: RwLock::new(false),
            }),
        })
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get the knowledge base
    pub fn knowledge_base(&self) -> &Arc<KnowledgeBase> {
        &self.inner.knowledge_base
    }

    /// Get the ingestion pipeline
    pub fn pipeline(&self) -> &IngestPipeline {
        &self.inner.pipeline
    }

    /// Get the retriever
    pub fn retriever(&self) -> &Retriever {
        &self.inner.retriever
    }

    /// When the state was built
    pub fn started_at(&self) -> DateTime<Utc> {
        self.inner.started_at
    }

    /// Check if the server is ready
    pub fn is_ready(&self) -> bool {
        *self.inner.ready.read()
    }

    /// Run the provider health checks and record the result
    ///
    /// Once ready, the state stays ready; later checks are skipped.
    pub async fn refresh_readiness(&self) -> bool {
        if self.is_ready() {
            return true;
        }

        let llm = self.inner.retriever.llm();
        let llm_ok = match llm.health_check().await {
            Ok(ok) => ok,
            Err(e) => {
                tracing::warn!("{} health check failed: {}", llm.name(), e);
                false
            }
        };
        let embedder_ok = match self.inner.knowledge_base.embedder_health().await {
            Ok(ok) => ok,
            Err(e) => {
                tracing::warn!("Embedding provider health check failed: {}", e);
                false
            }
        };

        let ready = llm_ok && embedder_ok;
        if ready {
            tracing::info!("Providers healthy, service ready");
        }
        *self.inner.ready.write() = ready;
        ready
    }
}
