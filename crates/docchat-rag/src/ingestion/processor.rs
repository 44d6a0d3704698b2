//! Ingestion pipeline orchestration

use crate::error::Result;
use crate::types::{Chunk, Document, FileType};

use super::chunker::WordChunker;
use super::parser::FileParser;

/// Extract + chunk one document
#[derive(Debug, Clone, Default)]
pub struct IngestPipeline {
    chunker: WordChunker,
}

impl IngestPipeline {
    /// Create a new ingestion pipeline
    pub fn new(chunker: WordChunker) -> Self {
        Self { chunker }
    }

    /// The chunker in use
    pub fn chunker(&self) -> &WordChunker {
        &self.chunker
    }

    /// Extract a document's text, resolving the format from its filename
    pub fn extract(&self, filename: &str, data: &[u8]) -> Result<Document> {
        let file_type = FileType::from_filename(filename)?;
        self.extract_as(filename, file_type, data)
    }

    /// Extract a document's text with an explicitly declared format
    pub fn extract_as(&self, filename: &str, file_type: FileType, data: &[u8]) -> Result<Document> {
        let parsed = FileParser::parse(file_type, filename, data)?;
        tracing::debug!(
            "Extracted {} chars from {} ({}, sha256 {}, pages {:?})",
            parsed.content.len(),
            filename,
            file_type,
            &parsed.content_hash[..12],
            parsed.total_pages
        );
        Ok(Document::new(filename, file_type, parsed.content))
    }

    /// Split a document into positioned chunks
    pub fn create_chunks(&self, doc: &Document) -> Vec<Chunk> {
        self.chunker.chunk(&doc.source, &doc.text)
    }

    /// Full ingestion: extract + chunk
    pub fn ingest(&self, filename: &str, data: &[u8]) -> Result<(Document, Vec<Chunk>)> {
        let doc = self.extract(filename, data)?;
        let chunks = self.create_chunks(&doc);
        tracing::debug!(
            "{}: {} words -> {} chunks",
            filename,
            doc.word_count(),
            chunks.len()
        );
        Ok((doc, chunks))
    }
}
