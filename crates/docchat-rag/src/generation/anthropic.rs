//! Anthropic Messages API client

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::providers::LlmProvider;

use super::retry::{AttemptError, RetryPolicy};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Messages API client implementing [`LlmProvider`]
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

impl AnthropicClient {
    /// Create a client from configuration; an API key is required
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::config("ANTHROPIC_API_KEY is not set"))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url().trim_end_matches('/').to_string(),
            api_key,
            model: config.model().to_string(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            retry: RetryPolicy::from_config(config),
        })
    }

    /// Override the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[async_trait]
impl LlmProvider for AnthropicClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/v1/messages", self.base_url);
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };
        let (client, url, request, api_key) = (&self.client, url.as_str(), &request, &self.api_key);

        tracing::info!("Generating answer with model: {}", self.model);

        self.retry
            .run(move || async move {
                let response = client
                    .post(url)
                    .header("x-api-key", api_key)
                    .header("anthropic-version", ANTHROPIC_VERSION)
                    .json(request)
                    .send()
                    .await
                    .map_err(Error::from)?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(AttemptError::from_status(status, &body, "Generation"));
                }

                let parsed: MessagesResponse = response.json().await.map_err(|e| {
                    AttemptError::fatal(Error::external(format!(
                        "Failed to parse generation response: {}",
                        e
                    )))
                })?;

                Ok(parsed
                    .content
                    .into_iter()
                    .filter(|block| block.kind == "text")
                    .map(|block| block.text)
                    .collect::<Vec<_>>()
                    .join(""))
            })
            .await
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(!self.api_key.is_empty())
    }

    fn name(&self) -> &str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
