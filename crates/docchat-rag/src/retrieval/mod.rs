//! Chunk index, shared knowledge base and question answering

mod index;
mod retriever;
mod store;

pub use index::{ChunkIndex, ScoredChunk};
pub use retriever::Retriever;
pub use store::{KnowledgeBase, PendingDocument};
