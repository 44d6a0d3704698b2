//! Configuration for the document chat service

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Vectorizer configuration
    pub vectorizer: VectorizerConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Generation service configuration
    pub llm: LlmConfig,
}

impl RagConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: RagConfig = toml::from_str(&content)
            .map_err(|e| Error::config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration the way the binaries do
    ///
    /// `DOCCHAT_CONFIG` names a TOML file; otherwise `<config dir>/docchat-rag/config.toml`
    /// is used when present, and defaults apply when it is not. Environment
    /// overrides are applied last.
    pub fn load() -> Result<Self> {
        let path = std::env::var("DOCCHAT_CONFIG")
            .map(PathBuf::from)
            .ok()
            .or_else(|| {
                dirs::config_dir()
                    .map(|dir| dir.join("docchat-rag").join("config.toml"))
                    .filter(|p| p.exists())
            });

        let mut config = match path {
            Some(path) => {
                tracing::info!("Loading configuration from {}", path.display());
                Self::from_file(&path)?
            }
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides using the given lookup
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("DOCCHAT_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("DOCCHAT_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| Error::config(format!("DOCCHAT_PORT is not a port: {}", port)))?;
        }
        if let Some(strategy) = lookup("DOCCHAT_STRATEGY") {
            self.vectorizer.strategy = match strategy.to_lowercase().as_str() {
                "sparse" => VectorizerStrategy::Sparse,
                "dense" => VectorizerStrategy::Dense,
                other => {
                    return Err(Error::config(format!(
                        "DOCCHAT_STRATEGY must be 'sparse' or 'dense', got '{}'",
                        other
                    )))
                }
            };
        }
        if let Some(key) = lookup("ANTHROPIC_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(url) = lookup("OLLAMA_BASE_URL") {
            if self.llm.provider == LlmBackend::Ollama {
                self.llm.base_url = Some(url.clone());
            }
            self.vectorizer.dense.ollama_url = url;
        }
        Ok(())
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;

        if self.retrieval.top_k == 0 {
            return Err(Error::config("retrieval.top_k must be >= 1"));
        }
        if self.vectorizer.dense.dimensions == 0 {
            return Err(Error::config("vectorizer.dense.dimensions must be >= 1"));
        }
        if self.vectorizer.sparse.max_features == Some(0) {
            return Err(Error::config("vectorizer.sparse.max_features must be >= 1"));
        }
        if self.llm.timeout_secs == 0 {
            return Err(Error::config("llm.timeout_secs must be >= 1"));
        }

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable permissive CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 50MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            enable_cors: true,
            max_upload_size: 50 * 1024 * 1024,
        }
    }
}

/// Word-window chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Window size in words
    pub window_words: usize,
    /// Words shared by consecutive windows; must be smaller than the window
    pub overlap_words: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            window_words: 1000,
            overlap_words: 200,
        }
    }
}

impl ChunkingConfig {
    /// Stride between window starts
    pub fn stride(&self) -> usize {
        self.window_words.saturating_sub(self.overlap_words)
    }

    /// Check `0 <= overlap < window`
    pub fn validate(&self) -> Result<()> {
        if self.window_words == 0 {
            return Err(Error::config("chunking.window_words must be >= 1"));
        }
        if self.overlap_words >= self.window_words {
            return Err(Error::config(format!(
                "chunking.overlap_words ({}) must be smaller than chunking.window_words ({})",
                self.overlap_words, self.window_words
            )));
        }
        Ok(())
    }
}

/// Vectorizer strategy, fixed for the lifetime of a service instance
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VectorizerStrategy {
    /// Corpus-wide TF-IDF, refit on every ingestion
    #[default]
    Sparse,
    /// Independent per-text embeddings
    Dense,
}

impl VectorizerStrategy {
    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sparse => "sparse",
            Self::Dense => "dense",
        }
    }
}

/// Vectorizer configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizerConfig {
    /// Active strategy
    pub strategy: VectorizerStrategy,
    /// TF-IDF settings
    pub sparse: SparseConfig,
    /// Dense embedding settings
    pub dense: DenseConfig,
}

/// TF-IDF settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SparseConfig {
    /// Vocabulary size cap; `None` (the default) admits every term.
    /// Once a cap is reached, terms first seen in later uploads are ignored.
    pub max_features: Option<usize>,
    /// Drop English stop words
    pub english_stop_words: bool,
}

impl Default for SparseConfig {
    fn default() -> Self {
        Self {
            max_features: None,
            english_stop_words: true,
        }
    }
}

/// Dense embedding backend
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DenseBackend {
    /// Local feature-hashing encoder
    #[default]
    Hashing,
    /// Ollama embeddings endpoint
    Ollama,
}

/// Dense embedding settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DenseConfig {
    /// Embedding backend
    pub backend: DenseBackend,
    /// Embedding dimensions (384 for the hashing encoder, 768 for nomic-embed-text)
    pub dimensions: usize,
    /// Ollama base URL (ollama backend)
    pub ollama_url: String,
    /// Ollama embedding model (ollama backend)
    pub ollama_model: String,
}

impl Default for DenseConfig {
    fn default() -> Self {
        Self {
            backend: DenseBackend::Hashing,
            dimensions: 384,
            ollama_url: "http://localhost:11434".to_string(),
            ollama_model: "nomic-embed-text".to_string(),
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Chunks handed to the generation service per question
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 3 }
    }
}

/// Generation service backend
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    /// Anthropic Messages API
    #[default]
    Anthropic,
    /// Local Ollama server
    Ollama,
}

/// Generation service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Backend provider
    pub provider: LlmBackend,
    /// Base URL; defaults per provider
    pub base_url: Option<String>,
    /// API key (Anthropic); usually taken from `ANTHROPIC_API_KEY`
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Model name; defaults per provider
    pub model: Option<String>,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for transient failures
    pub max_retries: u32,
    /// Base backoff between retries in milliseconds, doubled per attempt
    pub retry_backoff_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmBackend::Anthropic,
            base_url: None,
            api_key: None,
            model: None,
            max_tokens: 1000,
            temperature: 0.3,
            timeout_secs: 60,
            max_retries: 2,
            retry_backoff_ms: 1000,
        }
    }
}

impl LlmConfig {
    /// Base URL for the configured provider
    pub fn base_url(&self) -> &str {
        match (&self.base_url, self.provider) {
            (Some(url), _) => url,
            (None, LlmBackend::Anthropic) => "https://api.anthropic.com",
            (None, LlmBackend::Ollama) => "http://localhost:11434",
        }
    }

    /// Model for the configured provider
    pub fn model(&self) -> &str {
        match (&self.model, self.provider) {
            (Some(model), _) => model,
            (None, LlmBackend::Anthropic) => "claude-3-haiku-20240307",
            (None, LlmBackend::Ollama) => "llama3.2:3b",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = RagConfig::default();
        config.validate().unwrap();
        assert_eq!(config.chunking.window_words, 1000);
        assert_eq!(config.chunking.overlap_words, 200);
        assert_eq!(config.chunking.stride(), 800);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.vectorizer.strategy, VectorizerStrategy::Sparse);
        assert_eq!(config.llm.model(), "claude-3-haiku-20240307");
        assert_eq!(config.vectorizer.sparse.max_features, None);
    }

    #[test]
    fn test_overlap_must_be_smaller_than_window() {
        let chunking = ChunkingConfig { window_words: 100, overlap_words: 100 };
        assert!(matches!(chunking.validate(), Err(Error::Config(_))));

        let chunking = ChunkingConfig { window_words: 0, overlap_words: 0 };
        assert!(matches!(chunking.validate(), Err(Error::Config(_))));

        let chunking = ChunkingConfig { window_words: 2, overlap_words: 1 };
        chunking.validate().unwrap();
    }

    #[test]
    fn test_partial_toml() {
        let config: RagConfig = toml::from_str(
            r#"
            [chunking]
            window_words = 50
            overlap_words = 10

            [vectorizer]
            strategy = "dense"

            [llm]
            provider = "ollama"
            "#,
        )
        .unwrap();

        assert_eq!(config.chunking.stride(), 40);
        assert_eq!(config.vectorizer.strategy, VectorizerStrategy::Dense);
        assert_eq!(config.vectorizer.dense.dimensions, 384);
        assert_eq!(config.llm.base_url(), "http://localhost:11434");
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("DOCCHAT_PORT", "9000"),
            ("DOCCHAT_STRATEGY", "Dense"),
            ("ANTHROPIC_API_KEY", "sk-test"),
        ]
        .into_iter()
        .collect();

        let mut config = RagConfig::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.vectorizer.strategy, VectorizerStrategy::Dense);
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_bad_env_strategy() {
        let mut config = RagConfig::default();
        let result = config.apply_env(|key| {
            (key == "DOCCHAT_STRATEGY").then(|| "bm25".to_string())
        });
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_from_file_rejects_invalid_chunking() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[chunking]\nwindow_words = 10\noverlap_words = 20\n").unwrap();

        assert!(matches!(RagConfig::from_file(&path), Err(Error::Config(_))));
    }
}
