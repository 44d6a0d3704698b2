//! API routes for the document chat server

pub mod chat;
pub mod info;
pub mod upload;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Ingestion - with larger body limit for file uploads
        .route(
            "/upload",
            post(upload::upload_files).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/chat", post(chat::chat))
        .route("/info", get(info::info))
        .route("/stats", get(info::stats))
}
