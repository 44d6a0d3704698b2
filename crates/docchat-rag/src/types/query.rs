//! Query request types

use serde::{Deserialize, Serialize};

/// Chat request: a single question answered from the indexed documents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The question to answer
    #[serde(default)]
    pub message: String,

    /// Number of chunks to retrieve (falls back to `retrieval.top_k`)
    #[serde(default)]
    pub top_k: Option<usize>,

    /// Generation timeout in seconds (falls back to `llm.timeout_secs`)
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}
