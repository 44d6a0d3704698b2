//! Command-line client: index local documents and ask a question
//!
//! ```bash
//! docchat-rag ingest ./docs
//! docchat-rag ask "What is the refund policy?" --docs ./docs --top-k 5
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use walkdir::WalkDir;

use docchat_rag::{
    config::RagConfig,
    ingestion::{FileParser, IngestPipeline, WordChunker},
    providers,
    retrieval::{KnowledgeBase, PendingDocument, Retriever},
    FileType,
};

#[derive(Parser)]
#[command(name = "docchat-rag", about = "Ask questions about PDF, DOCX and TXT documents", version)]
struct Cli {
    /// Path to a TOML configuration file (overrides DOCCHAT_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract, chunk and index documents, then print index statistics
    Ingest {
        /// Files or directories to index
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Index documents and answer one question from them
    Ask {
        /// The question
        question: String,

        /// Files or directories to index first
        #[arg(long, required = true, num_args = 1..)]
        docs: Vec<PathBuf>,

        /// Chunks to use as context
        #[arg(long)]
        top_k: Option<usize>,

        /// Generation timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docchat_rag=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => {
            let mut config = RagConfig::from_file(path)?;
            config.apply_env(|key| std::env::var(key).ok())?;
            config.validate()?;
            config
        }
        None => RagConfig::load()?,
    };

    match cli.command {
        Commands::Ingest { paths } => {
            let kb = KnowledgeBase::from_config(&config, providers::build_embedder(&config)?)?;
            ingest_paths(&config, &kb, &paths).await?;
            let stats = kb.stats();
            println!(
                "{} {} chunks from {} sources ({} vectorizer, {} dimensions)",
                style("Indexed").green().bold(),
                stats.chunks,
                stats.sources,
                stats.strategy,
                stats.dimensions
            );
        }
        Commands::Ask {
            question,
            docs,
            top_k,
            timeout,
        } => {
            let llm = providers::build_llm(&config)?;
            let kb = Arc::new(KnowledgeBase::from_config(
                &config,
                providers::build_embedder(&config)?,
            )?);
            ingest_paths(&config, &kb, &docs).await?;

            let retriever = Retriever::new(
                Arc::clone(&kb),
                llm,
                config.retrieval.top_k,
                Duration::from_secs(config.llm.timeout_secs),
            );
            let answer = retriever
                .answer(&question, top_k, timeout.map(Duration::from_secs))
                .await?;

            println!("\n{}\n", answer.response);
            println!("{}", style("Sources:").bold());
            for source in &answer.sources {
                println!(
                    "  {} {} {}",
                    style(format!("{:.3}", source.score)).dim(),
                    source.source,
                    style(format!("(chunk {})", source.position)).dim()
                );
            }
        }
    }

    Ok(())
}

/// Supported files under `paths`, directories walked recursively
fn collect_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
            let file = entry.path();
            if entry.file_type().is_file() && is_supported(file) {
                files.push(file.to_path_buf());
            }
        }
    }
    files.sort();
    files
}

fn is_supported(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| FileType::from_filename(n).is_ok())
        .unwrap_or(false)
}

async fn ingest_paths(config: &RagConfig, kb: &KnowledgeBase, paths: &[PathBuf]) -> anyhow::Result<()> {
    let files = collect_files(paths);
    anyhow::ensure!(!files.is_empty(), "no pdf, docx or txt files found");

    let pipeline = IngestPipeline::new(WordChunker::from_config(&config.chunking)?);
    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}")
            .context("invalid progress template")?
            .progress_chars("#>-"),
    );

    let mut pending = Vec::new();
    for path in &files {
        pb.set_message(path.display().to_string());
        let (filename, file_type, data) = FileParser::read_path(path)?;
        let source = path.display().to_string();
        match pipeline
            .extract_as(&filename, file_type, &data)
            .map(|doc| pipeline.chunker().chunk(&source, &doc.text))
        {
            Ok(chunks) => pending.push(PendingDocument::new(source, chunks)),
            Err(e) => pb.println(format!("{} {}: {}", style("skipped").yellow(), path.display(), e)),
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    let names: Vec<String> = pending.iter().map(|d| d.source.clone()).collect();
    for (name, outcome) in names.iter().zip(kb.ingest(pending).await?) {
        if let Err(e) = outcome {
            eprintln!("{} {}: {}", style("skipped").yellow(), name, e);
        }
    }
    Ok(())
}
