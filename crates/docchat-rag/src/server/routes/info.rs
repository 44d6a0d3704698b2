//! Service description and index statistics

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::server::state::AppState;
use crate::types::IndexStats;

/// GET /api/info - Static description of the service
pub async fn info(State(state): State<AppState>) -> Json<Value> {
    let config = state.config();
    let llm = state.retriever().llm();

    Json(json!({
        "name": "docchat-rag",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Upload PDF, DOCX and TXT documents and ask questions answered from their most similar passages",
        "started_at": state.started_at().to_rfc3339(),
        "endpoints": {
            "POST /api/upload": "Upload documents (multipart, format from the filename extension)",
            "POST /api/chat": "Ask a question: {message, top_k?, timeout_secs?}",
            "GET /api/stats": "Index statistics",
            "GET /health": "Liveness check",
            "GET /ready": "Readiness check"
        },
        "vectorizer": config.vectorizer.strategy.as_str(),
        "chunking": {
            "window_words": config.chunking.window_words,
            "overlap_words": config.chunking.overlap_words
        },
        "top_k": config.retrieval.top_k,
        "llm": {
            "provider": llm.name(),
            "model": llm.model()
        }
    }))
}

/// GET /api/stats - Index statistics
pub async fn stats(State(state): State<AppState>) -> Json<IndexStats> {
    Json(state.knowledge_base().stats())
}
