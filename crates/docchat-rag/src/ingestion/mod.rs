//! Document ingestion: text extraction and word-window chunking

mod chunker;
mod parser;
mod processor;

pub use chunker::{WordChunker, WordChunks};
pub use parser::{FileParser, ParsedDocument};
pub use processor::IngestPipeline;
