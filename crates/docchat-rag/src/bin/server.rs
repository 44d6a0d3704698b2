//! Document chat server binary
//!
//! Run with: cargo run -p docchat-rag --bin docchat-rag-server

use docchat_rag::{config::RagConfig, server::RagServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docchat_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = RagConfig::load()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Vectorizer: {}", config.vectorizer.strategy.as_str());
    tracing::info!(
        "  - Chunking: {} words, {} overlap",
        config.chunking.window_words,
        config.chunking.overlap_words
    );
    tracing::info!("  - Top K: {}", config.retrieval.top_k);
    tracing::info!("  - LLM: {:?} ({})", config.llm.provider, config.llm.model());

    let server = RagServer::new(config)?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/upload - Upload documents");
    println!("  POST /api/chat   - Ask questions");
    println!("  GET  /api/stats  - Index statistics");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
