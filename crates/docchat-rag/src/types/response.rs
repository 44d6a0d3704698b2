//! Response types for ingestion and chat

use serde::{Deserialize, Serialize};

use super::document::ChunkSource;

/// Source metadata of a chunk used as answer context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// Source document identifier
    pub source: String,
    /// Chunk position within the source
    pub position: usize,
    /// Cosine similarity to the query
    pub score: f32,
}

impl Citation {
    /// Create a citation for a ranked chunk
    pub fn new(source: &ChunkSource, score: f32) -> Self {
        Self {
            source: source.source.clone(),
            position: source.position,
            score,
        }
    }
}

/// Answer to a chat query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Generated answer, or a descriptive message if generation failed
    pub response: String,
    /// Chunks used as context, in ranked order
    pub sources: Vec<Citation>,
}

impl QueryResponse {
    /// Create a new query response
    pub fn new(response: String, sources: Vec<Citation>) -> Self {
        Self { response, sources }
    }
}

/// A file that was ingested
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestedFile {
    /// Uploaded filename
    pub filename: String,
    /// Number of chunks created
    pub chunks: usize,
}

/// A file that was rejected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestError {
    /// Filename that failed
    pub filename: String,
    /// Error message
    pub error: String,
}

/// Response from document ingestion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    /// True when at least one file was ingested
    pub success: bool,
    /// Ingested files with their chunk counts
    pub files: Vec<IngestedFile>,
    /// Rejected files (partial success)
    pub errors: Vec<IngestError>,
    /// Total chunks created across all files
    pub total_chunks: usize,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

impl IngestResponse {
    /// Build a response from per-file outcomes
    pub fn new(files: Vec<IngestedFile>, errors: Vec<IngestError>, processing_time_ms: u64) -> Self {
        let total_chunks = files.iter().map(|f| f.chunks).sum();
        Self {
            success: !files.is_empty(),
            files,
            errors,
            total_chunks,
            processing_time_ms,
        }
    }

    /// Human-readable summary, e.g. for logs and the CLI
    pub fn summary(&self) -> String {
        let mut message = if self.files.is_empty() {
            "Failed to process any files.".to_string()
        } else {
            let names: Vec<&str> = self.files.iter().map(|f| f.filename.as_str()).collect();
            format!(
                "Successfully processed {} file(s): {}",
                self.files.len(),
                names.join(", ")
            )
        };

        if !self.errors.is_empty() {
            let errors: Vec<String> = self
                .errors
                .iter()
                .map(|e| format!("{}: {}", e.filename, e.error))
                .collect();
            message.push_str(&format!(" Errors: {}", errors.join("; ")));
        }

        message
    }
}

/// Index statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    /// Active vectorizer strategy
    pub strategy: String,
    /// Number of indexed chunks
    pub chunks: usize,
    /// Number of distinct sources
    pub sources: usize,
    /// Vector dimensionality (vocabulary size in sparse mode)
    pub dimensions: usize,
}
