//! docchat-rag: chat with your documents
//!
//! Uploaded PDF, DOCX and TXT files are split into overlapping word windows,
//! vectorized (corpus-wide TF-IDF or dense embeddings) and kept in an
//! in-memory index. Questions are answered by an external LLM from the most
//! similar chunks, and each answer lists the chunks it was given.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;
pub mod vectorize;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use retrieval::{ChunkIndex, KnowledgeBase, Retriever, ScoredChunk};
pub use types::{
    document::{Chunk, ChunkSource, Document, FileType},
    query::QueryRequest,
    response::{Citation, IngestResponse, QueryResponse},
};
