//! Chat endpoint

use axum::{extract::State, Json};
use std::time::Duration;

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{QueryRequest, QueryResponse};

/// POST /api/chat - Answer a question from the uploaded documents
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>> {
    tracing::info!("Chat: \"{}\"", request.message);

    let response = state
        .retriever()
        .answer(
            &request.message,
            request.top_k,
            request.timeout_secs.map(Duration::from_secs),
        )
        .await?;

    Ok(Json(response))
}
