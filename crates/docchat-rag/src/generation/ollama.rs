//! Ollama client for generation and embeddings with retry logic

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::retry::{AttemptError, RetryPolicy};

/// Ollama API client with automatic retry
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

impl OllamaClient {
    /// Create a client for the server at `base_url`
    pub fn new(base_url: impl Into<String>, timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(5)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry,
        })
    }

    /// Create a client from the generation service configuration
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        Self::new(
            config.base_url(),
            Duration::from_secs(config.timeout_secs),
            RetryPolicy::from_config(config),
        )
    }

    /// Server base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if Ollama is reachable
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// Embed one text with `model`
    pub async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);
        let (client, url) = (&self.client, url.as_str());

        self.retry
            .run(move || async move {
                let response = client
                    .post(url)
                    .json(&EmbedRequest { model, prompt: text })
                    .send()
                    .await
                    .map_err(Error::from)?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(AttemptError::from_status(status, &body, "Embedding"));
                }

                let parsed: EmbedResponse = response.json().await.map_err(|e| {
                    AttemptError::fatal(Error::external(format!(
                        "Failed to parse embedding response: {}",
                        e
                    )))
                })?;
                Ok(parsed.embedding)
            })
            .await
    }

    /// Complete `prompt` with `model`
    pub async fn generate(&self, model: &str, prompt: &str, temperature: f32) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let (client, url) = (&self.client, url.as_str());
        tracing::info!("Generating answer with model: {}", model);

        self.retry
            .run(move || async move {
                let request = GenerateRequest {
                    model,
                    prompt,
                    stream: false,
                    options: GenerateOptions { temperature },
                };

                let response = client
                    .post(url)
                    .json(&request)
                    .send()
                    .await
                    .map_err(Error::from)?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(AttemptError::from_status(status, &body, "Generation"));
                }

                let parsed: GenerateResponse = response.json().await.map_err(|e| {
                    AttemptError::fatal(Error::external(format!(
                        "Failed to parse generation response: {}",
                        e
                    )))
                })?;
                Ok(parsed.response)
            })
            .await
    }
}
