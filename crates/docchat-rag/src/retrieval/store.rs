//! Shared knowledge base: the chunk index plus the active vectorizer

use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;

use crate::config::{RagConfig, SparseConfig, VectorizerStrategy};
use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::types::{Chunk, IndexStats};
use crate::vectorize::{Embedding, SparseVectorizer};

use super::index::{ChunkIndex, ScoredChunk};

/// Chunks of one document waiting to be indexed
#[derive(Debug, Clone)]
pub struct PendingDocument {
    /// Source identifier
    pub source: String,
    /// Chunks in position order
    pub chunks: Vec<Chunk>,
}

impl PendingDocument {
    pub fn new(source: impl Into<String>, chunks: Vec<Chunk>) -> Self {
        Self {
            source: source.into(),
            chunks,
        }
    }
}

/// Index and sparse vocabulary, always updated together
#[derive(Debug, Default)]
struct IndexState {
    index: ChunkIndex,
    sparse: SparseVectorizer,
    /// Every accepted source, including ones that produced no chunks
    sources: HashSet<String>,
}

/// One per service instance, shared through `AppState`
///
/// Writers hold the write lock across append and sparse refit, so readers
/// never score against a half-refit vocabulary. Dense embedding happens
/// before the lock is taken.
pub struct KnowledgeBase {
    state: Arc<RwLock<IndexState>>,
    strategy: VectorizerStrategy,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
}

impl KnowledgeBase {
    /// Knowledge base using corpus-wide TF-IDF
    pub fn sparse(config: &SparseConfig) -> Self {
        Self {
            state: Arc::new(RwLock::new(IndexState {
                index: ChunkIndex::new(),
                sparse: SparseVectorizer::from_config(config),
                sources: HashSet::new(),
            })),
            strategy: VectorizerStrategy::Sparse,
            embedder: None,
        }
    }

    /// Knowledge base using a dense encoder
    pub fn dense(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            state: Arc::new(RwLock::new(IndexState::default())),
            strategy: VectorizerStrategy::Dense,
            embedder: Some(embedder),
        }
    }

    /// Build for the configured strategy; dense mode needs an embedder
    pub fn from_config(
        config: &RagConfig,
        embedder: Option<Arc<dyn EmbeddingProvider>>,
    ) -> Result<Self> {
        match (config.vectorizer.strategy, embedder) {
            (VectorizerStrategy::Sparse, _) => Ok(Self::sparse(&config.vectorizer.sparse)),
            (VectorizerStrategy::Dense, Some(embedder)) => Ok(Self::dense(embedder)),
            (VectorizerStrategy::Dense, None) => {
                Err(Error::config("dense strategy requires an embedding provider"))
            }
        }
    }

    pub fn strategy(&self) -> VectorizerStrategy {
        self.strategy
    }

    /// Number of indexed chunks
    pub fn len(&self) -> usize {
        self.state.read().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().index.is_empty()
    }

    /// Health of the dense encoder; sparse mode has no external dependency
    pub async fn embedder_health(&self) -> Result<bool> {
        match &self.embedder {
            Some(embedder) => embedder.health_check().await,
            None => Ok(true),
        }
    }

    /// Whether `source` has been accepted, even with zero chunks
    pub fn contains_source(&self, source: &str) -> bool {
        self.state.read().sources.contains(source)
    }

    /// Index a batch of documents
    ///
    /// Returns one outcome per document, in input order: the number of chunks
    /// indexed, or why the document was rejected. A document whose source is
    /// already indexed (or repeated within the batch) is rejected with
    /// `DuplicateKey`. In sparse mode the vocabulary is refit once over the
    /// whole corpus and every stored vector recomputed.
    pub async fn ingest(&self, documents: Vec<PendingDocument>) -> Result<Vec<Result<usize>>> {
        let mut embedded = Vec::with_capacity(documents.len());
        for doc in documents {
            let vectors = match &self.embedder {
                Some(embedder) => {
                    let texts: Vec<String> = doc.chunks.iter().map(|c| c.text.clone()).collect();
                    match embedder.embed_batch(&texts).await {
                        Ok(vectors) => Ok(Some(vectors)),
                        Err(e) => {
                            tracing::warn!("Embedding failed for {}: {}", doc.source, e);
                            Err(e)
                        }
                    }
                }
                None => Ok(None),
            };
            embedded.push((doc, vectors));
        }

        let state = Arc::clone(&self.state);
        let strategy = self.strategy;
        tokio::task::spawn_blocking(move || {
            let mut guard = state.write();
            let outcomes = append_documents(&mut guard, embedded);

            if strategy == VectorizerStrategy::Sparse && outcomes.iter().any(|o| o.is_ok()) {
                refit(&mut guard)?;
            }
            Ok(outcomes)
        })
        .await
        .map_err(|e| Error::internal(format!("Indexing task failed: {}", e)))?
    }

    /// The `k` chunks most similar to `question`, best first
    ///
    /// Scoring runs on the blocking pool: the read lock can wait behind a
    /// sparse refit holding the write lock.
    pub async fn search(&self, question: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        let dense = match &self.embedder {
            Some(embedder) => Some(Embedding::Dense(embedder.embed(question).await?)),
            None => None,
        };

        let state = Arc::clone(&self.state);
        let question = question.to_string();
        tokio::task::spawn_blocking(move || {
            let guard = state.read();
            let vector = match dense {
                Some(vector) => vector,
                None => Embedding::Sparse(guard.sparse.transform(&question)),
            };
            guard.index.query(&vector, k)
        })
        .await
        .map_err(|e| Error::internal(format!("Search task failed: {}", e)))
    }

    /// Index statistics
    pub fn stats(&self) -> IndexStats {
        let guard = self.state.read();
        let dimensions = match &self.embedder {
            Some(embedder) => embedder.dimensions(),
            None => guard.sparse.vocabulary_len(),
        };
        IndexStats {
            strategy: self.strategy.as_str().to_string(),
            chunks: guard.index.len(),
            sources: guard.index.sources().len(),
            dimensions,
        }
    }
}

type Embedded = (PendingDocument, Result<Option<Vec<Vec<f32>>>>);

fn append_documents(state: &mut IndexState, documents: Vec<Embedded>) -> Vec<Result<usize>> {
    let IndexState { index, sources, .. } = state;

    documents
        .into_iter()
        .map(|(doc, vectors)| {
            let vectors = vectors?;
            if !sources.insert(doc.source.clone()) {
                return Err(Error::DuplicateKey {
                    document: doc.source,
                    position: 0,
                });
            }

            let count = doc.chunks.len();
            match vectors {
                Some(vectors) => {
                    for (chunk, vector) in doc.chunks.into_iter().zip(vectors) {
                        index.append(chunk, Embedding::Dense(vector))?;
                    }
                }
                None => {
                    // Placeholder until the refit assigns real vectors
                    for chunk in doc.chunks {
                        index.append(chunk, Embedding::Sparse(Default::default()))?;
                    }
                }
            }
            Ok(count)
        })
        .collect()
}

fn refit(state: &mut IndexState) -> Result<()> {
    let corpus: Vec<&str> = state.index.chunks().map(|c| c.text.as_str()).collect();
    let vectors = state.sparse.fit_transform(&corpus);
    tracing::info!(
        "Refit TF-IDF over {} chunks, vocabulary {}",
        vectors.len(),
        state.sparse.vocabulary_len()
    );
    state
        .index
        .revectorize(vectors.into_iter().map(Embedding::Sparse).collect())
}
